mod traits;
mod ollama;

pub use traits::*;
pub use ollama::{LocalModel, OllamaClient, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
