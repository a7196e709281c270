/// Generator trait and error taxonomy for answer generation.
///
/// The generative model is an external service reached through this narrow
/// contract. Failures are classified so the QA engine can hand users a
/// distinct message per category instead of a raw transport error.
pub mod mock;
pub mod openai;

use thiserror::Error;

/// Errors that can occur while generating an answer.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("generation API authentication failed")]
    Auth,

    #[error("generation API rate limit hit")]
    RateLimited,

    #[error("generation API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("generation request timed out")]
    Timeout,

    #[error("generation failed: {0}")]
    Other(String),
}

/// Trait for answer-generation implementations.
///
/// Implementations must be `Send + Sync` for shared use behind `Arc`.
pub trait Generator: Send + Sync {
    /// Produce a completion for the rendered prompt.
    fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;

    /// Name of the underlying model, used for token-budget lookups.
    fn model_name(&self) -> &str;
}
