/// Mock embedder for tests and offline runs.
///
/// Generates deterministic unit vectors from a text hash, so retrieval
/// behaves consistently without calling the real embedding API.
use std::hash::{DefaultHasher, Hash, Hasher};

use super::{Embedder, EmbedderError};

pub struct MockEmbedder {
    pub dimensions: usize,
}

impl MockEmbedder {
    /// Create a new `MockEmbedder` with the given dimensionality.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self { dimensions: 384 }
    }
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let hash = hasher.finish();

        // Hash bytes seed deterministic float values.
        let bytes = hash.to_le_bytes();
        let mut embedding = Vec::with_capacity(self.dimensions);
        for i in 0..self.dimensions {
            embedding.push(bytes[i % 8] as f32 / 255.0);
        }

        // L2 normalize
        let norm_sq: f32 = embedding.iter().map(|v| v * v).sum();
        if norm_sq > 0.0 {
            let inv = 1.0 / norm_sq.sqrt();
            for v in &mut embedding {
                *v *= inv;
            }
        }

        Ok(embedding)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
