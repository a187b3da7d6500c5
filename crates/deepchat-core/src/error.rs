use thiserror::Error;

/// Every way a call to the model backend can fail.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Model backend unreachable at {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("Model backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("Malformed response from model backend: {0}")]
    Malformed(String),

    #[error("Model backend returned an empty response")]
    EmptyResponse,

    #[error("Invalid model backend endpoint: {0}")]
    InvalidEndpoint(String),
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("User message is empty")]
    EmptyInput,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenerationError {
    /// Connection-level failures, as opposed to the backend answering badly.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
