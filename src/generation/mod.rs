//! Text generation: prompt construction, the LLM client and Markdown rendering.
//!
//! - `prompts` - fixed templates for every workflow
//! - `groq` - `TextGenerator` backed by Groq's OpenAI-compatible API
//! - `markdown` - model output to display-safe HTML

pub mod groq;
pub mod markdown;
pub mod prompts;

pub use groq::GroqClient;
pub use markdown::render_markdown;
pub use prompts::PromptTemplate;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a single generation attempt. Never retried.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generation service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed generation response: {0}")]
    MalformedResponse(String),
    #[error("generation service returned no content")]
    EmptyCompletion,
}

/// Anything that turns a prompt into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
