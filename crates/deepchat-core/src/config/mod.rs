use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::context::{SystemPromptBuilder, DEFAULT_GREETING, DEFAULT_SYSTEM_INSTRUCTION};
use crate::error::{ChatError, Result};
use crate::llm::{OllamaClient, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmSettings,
    pub chat: ChatSettings,
    pub ui: UiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    /// Active model identifier, passed to the server unchanged.
    pub model: String,
    /// Models offered by the model picker.
    pub models: Vec<String>,
    pub temperature: f64,
    /// Client-side request timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatSettings {
    pub system_instruction: String,
    pub custom_instructions: Option<String>,
    pub greeting: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiSettings {
    pub theme: String,
    pub show_sidebar: bool,
    /// Bullet points shown under "Model Capabilities" in the sidebar.
    pub capabilities: Vec<String>,
    /// Footer lines at the bottom of the sidebar.
    pub credits: Vec<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            models: vec![DEFAULT_MODEL.to_string()],
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: None,
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            custom_instructions: None,
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            show_sidebar: true,
            capabilities: vec![
                "🐍 Python Expert".to_string(),
                "🐞 Debugging Assistant".to_string(),
                "📝 Code Documentation".to_string(),
                "💡 Solution Design".to_string(),
            ],
            credits: vec![
                "Built with Ollama | ratatui".to_string(),
                "Try Generative AI Models at SkillPediaAI".to_string(),
            ],
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("deepchat")
            .join("config.toml")
    }

    /// Load `path`, or defaults when it does not exist. A file that exists
    /// but cannot be read or parsed is an error, so the caller can tell the
    /// user instead of silently running on defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ChatError::Config(e.to_string()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ChatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Make `model` the active model, adding it to the picker list if new.
    pub fn select_model(&mut self, model: impl Into<String>) {
        let model = model.into();
        if !self.llm.models.contains(&model) {
            self.llm.models.push(model.clone());
        }
        self.llm.model = model;
    }

    /// The system instruction with any custom instructions folded in.
    pub fn system_instruction(&self) -> String {
        let mut builder = SystemPromptBuilder::new().with_base(&self.chat.system_instruction);
        if let Some(ref extra) = self.chat.custom_instructions {
            builder = builder.with_custom_instructions(extra);
        }
        builder.build()
    }

    /// Build a client for the active model.
    pub fn build_llm_client(&self) -> OllamaClient {
        self.client_for_model(&self.llm.model)
    }

    pub fn client_for_model(&self, model: &str) -> OllamaClient {
        let client = OllamaClient::new(model)
            .with_base_url(&self.llm.base_url)
            .with_temperature(self.llm.temperature);
        match self.llm.timeout_secs {
            Some(secs) if secs > 0 => client.with_timeout(Duration::from_secs(secs)),
            _ => client,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmClient;

    #[test]
    fn test_defaults_match_local_deepseek() {
        let settings = Settings::default();
        assert_eq!(settings.llm.base_url, "http://localhost:11434");
        assert_eq!(settings.llm.model, "deepseek-r1:latest");
        assert_eq!(settings.ui.capabilities.len(), 4);
        assert_eq!(settings.ui.credits.len(), 2);
        assert_eq!(settings.system_instruction(), DEFAULT_SYSTEM_INSTRUCTION);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [llm]
            model = "qwen2.5-coder:7b"
            "#,
        )
        .unwrap();
        assert_eq!(settings.llm.model, "qwen2.5-coder:7b");
        assert_eq!(settings.llm.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.chat.greeting, DEFAULT_GREETING);
        assert_eq!(settings.ui.theme, "dark");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.llm.timeout_secs = Some(90);
        settings.chat.custom_instructions = Some("Prefer Rust examples.".into());
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_temperature_is_written_as_typed() {
        let content = toml::to_string_pretty(&Settings::default()).unwrap();
        assert!(content.contains("temperature = 0.3\n"), "{content}");

        let mut settings = Settings::default();
        settings.llm.temperature = 0.7;
        let content = toml::to_string_pretty(&settings).unwrap();
        assert!(content.contains("temperature = 0.7\n"), "{content}");
    }

    #[test]
    fn test_load_or_default_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_or_default_reports_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ui]\nshow_sidebar = \"maybe\"").unwrap();
        assert!(matches!(
            Settings::load_or_default(&path),
            Err(ChatError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[llm\nmodel = ").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(ChatError::Config(_))));
    }

    #[test]
    fn test_select_model_adds_to_picker() {
        let mut settings = Settings::default();
        settings.select_model("llama3.2");
        settings.select_model("llama3.2");
        assert_eq!(settings.llm.model, "llama3.2");
        assert_eq!(settings.llm.models, vec!["deepseek-r1:latest", "llama3.2"]);
        assert_eq!(settings.build_llm_client().model(), "llama3.2");
    }

    #[test]
    fn test_custom_instructions_in_system_instruction() {
        let mut settings = Settings::default();
        settings.chat.custom_instructions = Some("Answer in Spanish.".into());
        let instruction = settings.system_instruction();
        assert!(instruction.starts_with(DEFAULT_SYSTEM_INSTRUCTION));
        assert!(instruction.contains("Answer in Spanish."));
    }
}
