pub mod error;
pub mod llm;
pub mod context;
pub mod config;
pub mod session;

// Re-export key types
pub use error::{ChatError, GenerationError};
pub use llm::{LlmClient, LlmResponse, Message, OllamaClient, Role, Usage};
pub use context::{
    ConversationLog, Generation, MessageTemplate, PromptChain, PromptChainBuilder, SystemPromptBuilder,
    TemplateKind, Turn,
};
pub use config::Settings;
pub use session::{ChatSession, PendingExchange, SessionStats, SubmitOutcome};
