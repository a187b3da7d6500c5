pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are an expert AI coding assistant. \
Provide concise, correct answers with print statements for debugging. \
Always respond in English or Language specified.";

/// Composes the fixed system instruction that heads every prompt chain.
pub struct SystemPromptBuilder {
    base: String,
    custom_instructions: Option<String>,
}

impl SystemPromptBuilder {
    pub fn new() -> Self {
        Self {
            base: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            custom_instructions: None,
        }
    }

    /// Replace the built-in instruction entirely.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    /// Extra instructions appended after the base one. Blank input is ignored.
    pub fn with_custom_instructions(mut self, instructions: impl Into<String>) -> Self {
        let instructions = instructions.into();
        if !instructions.trim().is_empty() {
            self.custom_instructions = Some(instructions);
        }
        self
    }

    pub fn build(&self) -> String {
        let mut prompt = self.base.trim().to_string();
        if let Some(ref instructions) = self.custom_instructions {
            prompt.push_str("\n\n## Additional Instructions\n");
            prompt.push_str(instructions.trim());
        }
        prompt
    }
}

impl Default for SystemPromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_the_coding_assistant_instruction() {
        assert_eq!(SystemPromptBuilder::new().build(), DEFAULT_SYSTEM_INSTRUCTION);
    }

    #[test]
    fn test_custom_instructions_are_appended() {
        let prompt = SystemPromptBuilder::new()
            .with_custom_instructions("Answer in French.")
            .build();
        assert!(prompt.starts_with(DEFAULT_SYSTEM_INSTRUCTION));
        assert!(prompt.ends_with("Answer in French."));
    }

    #[test]
    fn test_blank_custom_instructions_ignored() {
        let prompt = SystemPromptBuilder::new()
            .with_base("Be terse.")
            .with_custom_instructions("   ")
            .build();
        assert_eq!(prompt, "Be terse.");
    }
}
