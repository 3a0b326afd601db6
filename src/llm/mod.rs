pub mod ollama;

pub use ollama::OllamaClient;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Ollama connection failed: {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Ollama returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

/// Trait for LLM text generation. Opaque: (system, prompt) → text,
/// no streaming contract.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}

/// Trait for query embedding.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;
}
