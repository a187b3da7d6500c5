use crate::error::GenerationError;
use crate::llm::traits::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "deepseek-r1:latest";
pub const DEFAULT_TEMPERATURE: f64 = 0.3;

/// Client for a local Ollama server, speaking its non-streaming `/api/chat`.
#[derive(Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    model: String,
    base_url: String,
    temperature: f64,
    timeout: Option<Duration>,
}

impl OllamaClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Client-side request timeout. Without one, a request waits for as long
    /// as the server takes.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// List the models installed on the server (`GET /api/tags`).
    pub async fn list_models(&self) -> Result<Vec<LocalModel>, GenerationError> {
        let url = format!("{}/api/tags", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| send_error(&url, e))?;
        let body = read_success_body(response).await?;
        let tags: TagsResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::Malformed(format!("model list: {e}")))?;

        Ok(tags.models)
    }
}

/// A model installed on the Ollama server.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LocalModel {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<LocalModel>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

fn send_error(url: &str, e: reqwest::Error) -> GenerationError {
    if e.is_builder() {
        GenerationError::InvalidEndpoint(format!("{url}: {e}"))
    } else {
        GenerationError::Unreachable {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

async fn read_success_body(response: reqwest::Response) -> Result<String, GenerationError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| GenerationError::Malformed(format!("failed to read body: {e}")))?;

    if !status.is_success() {
        // Ollama reports failures as {"error": "..."}; fall back to the raw body.
        let body = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        return Err(GenerationError::Backend {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    async fn chat(&self, messages: &[Message]) -> Result<LlmResponse, GenerationError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: ChatOptions {
                temperature: self.temperature,
            },
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!(model = %self.model, messages = messages.len(), "Sending Ollama chat request");

        let response = request.send().await.map_err(|e| send_error(&url, e))?;
        let body = read_success_body(response).await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;

        let message = parsed
            .message
            .ok_or_else(|| GenerationError::Malformed("response has no message".into()))?;

        let usage = match (parsed.prompt_eval_count, parsed.eval_count) {
            (None, None) => None,
            (input, output) => Some(Usage {
                input_tokens: input.unwrap_or(0),
                output_tokens: output.unwrap_or(0),
            }),
        };

        Ok(LlmResponse {
            message: Message::assistant(message.content),
            usage,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = OllamaClient::new("m").with_base_url("http://gpu-box:11434/");
        assert_eq!(client.base_url(), "http://gpu-box:11434");
    }

    #[test]
    fn test_defaults() {
        let client = OllamaClient::new(DEFAULT_MODEL);
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.model(), "deepseek-r1:latest");
        assert!((client.temperature() - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![Message::system("be brief"), Message::user("hi")];
        let body = ChatRequest {
            model: "deepseek-r1:latest",
            messages: &messages,
            stream: false,
            options: ChatOptions { temperature: 0.3 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "deepseek-r1:latest");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert!(json["options"]["temperature"].as_f64().unwrap() > 0.29);
    }
}
