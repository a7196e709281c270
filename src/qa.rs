//! Retrieval-answer orchestration.
//!
//! One entry point, [`QaEngine::answer_question`], walks the full query
//! path: resolve course → embed question → search → assemble context under
//! the model's token budget → generate. Every failure along the way is
//! converted into a descriptive answer string; the engine never lets a
//! fault escape to the surrounding service.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::courses::CourseRegistry;
use crate::embedder::Embedder;
use crate::generator::{Generator, GeneratorError};
use crate::prompt::{self, REFUSAL};
use crate::tokens;

pub struct QaEngine {
    registry: Arc<CourseRegistry>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    config: Config,
}

impl QaEngine {
    pub fn new(
        registry: Arc<CourseRegistry>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let config = registry.config().clone();
        Self {
            registry,
            embedder,
            generator,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<CourseRegistry> {
        &self.registry
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Answer a question from a course's notes.
    ///
    /// Always returns an answer-shaped string, even when that string
    /// communicates a failure.
    pub fn answer_question(&self, question: &str, course: Option<&str>) -> String {
        let code = self.registry.canonical_course(course);

        // 1. Resolve the course index. Absence is a user-fixable state, not
        //    a fault: the service keeps running.
        let store = match self.registry.resolve(&code) {
            Ok(Some(store)) => store,
            Ok(None) => {
                return format!(
                    "Course {code} is not initialized. Run `studyrag build --course {code}` \
                     or POST /courses/{code}/reload first."
                );
            }
            Err(e) => {
                warn!("failed to resolve course {code}: {e}");
                return format!("Failed to load the index for course {code}: {e}");
            }
        };

        // 2. Embed the question.
        let query = match self.embedder.embed(question) {
            Ok(v) => v,
            Err(e) => {
                warn!("question embedding failed: {e}");
                return format!("Could not embed the question: {e}");
            }
        };

        // 3. Retrieve nearest chunks.
        let retrieved = match store.search(&query, self.config.search_top_k) {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!("search failed for course {code}: {e}");
                return format!("Search failed for course {code}: {e}");
            }
        };
        if retrieved.is_empty() {
            // Nothing indexed matches; a normal outcome, answered with the
            // same refusal the model itself is instructed to use.
            return REFUSAL.to_string();
        }

        // 4. Assemble the prompt under the model's token budget.
        let prompt = self.assemble_prompt(question, retrieved);

        // 5. Generate, classifying failures into distinct user messages.
        match self.generator.generate(&prompt) {
            Ok(answer) => {
                info!("answered question for course {code}");
                answer
            }
            Err(e) => Self::describe_generation_failure(&e),
        }
    }

    /// Two-stage context assembly: a generous first pass against the
    /// model's available budget, then a stricter re-truncation when the
    /// rendered prompt still overshoots the estimate.
    fn assemble_prompt(&self, question: &str, retrieved: Vec<String>) -> String {
        let model = self.generator.model_name();
        let available = self
            .config
            .token_limit(model)
            .saturating_sub(tokens::RESERVED_TOKENS);

        let selected = tokens::truncate_chunks_by_tokens(&retrieved, available);
        let prompt = prompt::build_prompt(question, &selected);

        let (safe, budget) = tokens::is_prompt_safe(&prompt, model);
        if safe {
            return prompt;
        }

        warn!(
            "prompt over budget after first pass ({} > {} tokens), re-truncating",
            budget.estimated_tokens, budget.available_tokens
        );
        let reselected = tokens::truncate_chunks_by_tokens(&selected, available / 2);
        prompt::build_prompt(question, &reselected)
    }

    fn describe_generation_failure(err: &GeneratorError) -> String {
        match err {
            GeneratorError::Auth => {
                "The answer service rejected our credentials. Check the configured API key."
                    .to_string()
            }
            GeneratorError::RateLimited => {
                "The answer service is rate-limiting requests. Please try again shortly."
                    .to_string()
            }
            GeneratorError::Api { status, .. } => {
                format!("The answer service returned an error (status {status}). Please try again.")
            }
            GeneratorError::Timeout => {
                "The answer service took too long to respond. Please try again.".to_string()
            }
            GeneratorError::Other(msg) => {
                format!("Could not generate an answer: {msg}")
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
