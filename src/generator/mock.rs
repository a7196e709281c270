/// Mock generator for tests and offline runs.
use super::{Generator, GeneratorError};

/// Returns a fixed canned answer for every prompt.
pub struct MockGenerator {
    pub answer: String,
    pub model: String,
}

impl MockGenerator {
    #[must_use]
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            model: "mock-model".to_string(),
        }
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new("This is a mock answer.")
    }
}

impl Generator for MockGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, GeneratorError> {
        Ok(self.answer.clone())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
