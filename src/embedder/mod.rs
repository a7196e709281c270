/// Embedder trait and shared types for text embedding.
///
/// The embedding model is an external service; the rest of the crate only
/// sees this narrow contract.
pub mod mock;
pub mod openai;

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("embedding request failed: {0}")]
    RequestFailed(String),

    #[error("embedding request timed out")]
    Timeout,

    #[error("embedding API authentication failed")]
    Auth,

    #[error("embedding API rate limit hit")]
    RateLimited,

    #[error("unexpected embedding response: {0}")]
    BadResponse(String),
}

/// Trait for text embedding implementations.
///
/// All implementations must be `Send + Sync` to allow concurrent use
/// behind `Arc`.
pub trait Embedder: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;

    /// Embed multiple text strings into vectors.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError>;

    /// Return the dimensionality of the embedding vectors.
    fn dimensions(&self) -> usize;
}
