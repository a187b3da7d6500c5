//! One chat session: the conversation log plus the submit flow that drives it.
//!
//! A session is owned by whatever drives it (the TUI loop, a one-shot prompt)
//! and passed around explicitly. Sessions share no mutable state, so several
//! can run side by side.

use crate::config::Settings;
use crate::context::{generate, ConversationLog, Generation, PromptChain, PromptChainBuilder, Turn};
use crate::error::{ChatError, GenerationError, Result};
use crate::llm::LlmClient;

/// What happened to a submitted piece of user text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing was recorded or sent.
    Ignored,
    /// The backend answered; both turns are now in the log.
    Replied(String),
}

/// A user turn waiting on its reply, with the chain that was built for it.
#[derive(Debug, Clone)]
pub struct PendingExchange {
    user: Turn,
    chain: PromptChain,
}

impl PendingExchange {
    pub fn input(&self) -> &str {
        self.user.content()
    }

    pub fn chain(&self) -> &PromptChain {
        &self.chain
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub exchanges: usize,
    pub failures: usize,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

pub struct ChatSession {
    id: String,
    log: ConversationLog,
    builder: PromptChainBuilder,
    greeting: String,
    stats: SessionStats,
}

impl ChatSession {
    pub fn new(system_instruction: impl Into<String>, greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            log: ConversationLog::with_greeting(greeting.clone()),
            builder: PromptChainBuilder::new(system_instruction),
            greeting,
            stats: SessionStats::default(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.system_instruction(), settings.chat.greeting.clone())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn system_instruction(&self) -> &str {
        self.builder.system_instruction()
    }

    /// The chain the next generation would see, without a pending turn.
    pub fn current_chain(&self) -> PromptChain {
        self.builder.build(&self.log)
    }

    /// Record `input` and the model's reply.
    ///
    /// The log only changes when generation succeeds: on error neither the
    /// user turn nor an assistant turn is kept, so the user can retry.
    pub async fn submit(&mut self, llm: &dyn LlmClient, input: &str) -> Result<SubmitOutcome> {
        let Some(exchange) = self.prepare(input) else {
            return Ok(SubmitOutcome::Ignored);
        };

        tracing::debug!(
            session = %self.id,
            model = llm.model(),
            templates = exchange.chain().len(),
            "Submitting prompt chain"
        );

        let result = generate(exchange.chain(), llm).await;
        self.complete(exchange, result)
    }

    /// Build the chain for `input` without touching the log. `None` for
    /// blank input.
    ///
    /// Pair with [`complete`](Self::complete) when generation runs somewhere
    /// else (a spawned task). Dropping the exchange instead abandons it and
    /// leaves the session as it was.
    pub fn prepare(&self, input: &str) -> Option<PendingExchange> {
        if input.trim().is_empty() {
            return None;
        }
        let user = Turn::user(input);
        let chain = self.builder.build_with_pending(&self.log, &user);
        Some(PendingExchange { user, chain })
    }

    /// Record the result of generating `exchange`.
    pub fn complete(
        &mut self,
        exchange: PendingExchange,
        result: std::result::Result<Generation, GenerationError>,
    ) -> Result<SubmitOutcome> {
        let reply = match result {
            Ok(Generation { text, usage }) => {
                if let Some(usage) = usage {
                    self.stats.prompt_tokens += u64::from(usage.input_tokens);
                    self.stats.completion_tokens += u64::from(usage.output_tokens);
                }
                text
            }
            Err(e) => {
                self.stats.failures += 1;
                tracing::warn!(session = %self.id, "Generation failed: {e}");
                return Err(ChatError::Generation(e));
            }
        };

        self.log.append(exchange.user)?;
        self.log.append(Turn::assistant(reply.clone()))?;
        self.stats.exchanges += 1;

        tracing::info!(session = %self.id, turns = self.log.len(), "Generation complete");

        Ok(SubmitOutcome::Replied(reply))
    }

    /// Start over with a freshly seeded log under a new session id.
    pub fn reset(&mut self) {
        self.id = uuid::Uuid::new_v4().to_string();
        self.log = ConversationLog::with_greeting(self.greeting.clone());
        self.stats = SessionStats::default();
    }

    /// Drop every turn, the greeting included.
    pub fn clear(&mut self) {
        self.log.clear();
    }
}
