mod history;
mod builder;
pub mod system_prompt;

pub use history::{ConversationLog, Turn, DEFAULT_GREETING};
pub use builder::{
    extract_text, generate, invoke, Generation, MessageTemplate, PromptChain, PromptChainBuilder,
    TemplateKind,
};
pub use system_prompt::{SystemPromptBuilder, DEFAULT_SYSTEM_INSTRUCTION};
