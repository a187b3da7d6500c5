use crate::context::history::{ConversationLog, Turn};
use crate::context::system_prompt::DEFAULT_SYSTEM_INSTRUCTION;
use crate::error::GenerationError;
use crate::llm::{LlmClient, LlmResponse, Message, Role, Usage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    System,
    Human,
    Assistant,
}

/// A role-tagged message template. The text is taken literally: braces are
/// not placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    pub kind: TemplateKind,
    pub text: String,
}

impl MessageTemplate {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            kind: TemplateKind::System,
            text: text.into(),
        }
    }

    pub fn human(text: impl Into<String>) -> Self {
        Self {
            kind: TemplateKind::Human,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            kind: TemplateKind::Assistant,
            text: text.into(),
        }
    }

    pub fn to_message(&self) -> Message {
        match self.kind {
            TemplateKind::System => Message::system(&self.text),
            TemplateKind::Human => Message::user(&self.text),
            TemplateKind::Assistant => Message::assistant(&self.text),
        }
    }
}

/// Ordered templates submitted together to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromptChain {
    templates: Vec<MessageTemplate>,
}

impl PromptChain {
    pub fn templates(&self) -> &[MessageTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Assemble the request payload, one message per template, in order.
    pub fn to_messages(&self) -> Vec<Message> {
        self.templates.iter().map(MessageTemplate::to_message).collect()
    }
}

/// Turns a conversation log into a prompt chain headed by a fixed system
/// instruction.
#[derive(Debug, Clone)]
pub struct PromptChainBuilder {
    system_instruction: String,
}

impl PromptChainBuilder {
    pub fn new(system_instruction: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
        }
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// `[system] + one template per turn`, in log order.
    pub fn build(&self, log: &ConversationLog) -> PromptChain {
        self.build_from_turns(log.iter())
    }

    /// Like [`build`](Self::build), with `pending` appended as if it were
    /// already the last turn of the log.
    pub fn build_with_pending(&self, log: &ConversationLog, pending: &Turn) -> PromptChain {
        self.build_from_turns(log.iter().chain(std::iter::once(pending)))
    }

    fn build_from_turns<'a>(&self, turns: impl Iterator<Item = &'a Turn>) -> PromptChain {
        let mut templates = vec![MessageTemplate::system(&self.system_instruction)];

        for turn in turns {
            match turn.role() {
                Role::User => templates.push(MessageTemplate::human(turn.content())),
                Role::Assistant => templates.push(MessageTemplate::assistant(turn.content())),
                // The fixed instruction already occupies the system slot.
                Role::System => {
                    tracing::debug!("Skipping system turn found inside the conversation log");
                }
            }
        }

        tracing::debug!(templates = templates.len(), "Built prompt chain");
        PromptChain { templates }
    }
}

impl Default for PromptChainBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_INSTRUCTION)
    }
}

/// Output parser: pull the plain reply text out of a backend response.
pub fn extract_text(response: LlmResponse) -> Result<String, GenerationError> {
    let text = response.message.content;
    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}

/// Send the assembled chain to the backend and return its raw response.
pub async fn invoke(chain: &PromptChain, llm: &dyn LlmClient) -> Result<LlmResponse, GenerationError> {
    let messages = chain.to_messages();
    llm.chat(&messages).await
}

/// A parsed reply and the token usage the backend reported for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub usage: Option<Usage>,
}

/// Submit `chain` to `llm` and return the reply text. No retries.
pub async fn generate(chain: &PromptChain, llm: &dyn LlmClient) -> Result<Generation, GenerationError> {
    let response = invoke(chain, llm).await?;
    let usage = response.usage;
    Ok(Generation {
        text: extract_text(response)?,
        usage,
    })
}
