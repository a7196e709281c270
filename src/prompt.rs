/// Prompt rendering for grounded question answering.
///
/// The template instructs the model to answer only from the supplied notes
/// and to emit a fixed refusal string when they do not contain the answer.
/// The refusal string doubles as the "nothing retrieved" answer, so callers
/// can rely on one recognizable sentence for both cases.

/// Fixed refusal emitted when the notes cannot answer the question.
pub const REFUSAL: &str = "The notes do not contain this information.";

/// Separator between context chunks inside the prompt.
const CHUNK_SEPARATOR: &str = "\n\n---\n\n";

/// Render the generation prompt from the question and its retrieved chunks.
pub fn build_prompt(question: &str, chunks: &[String]) -> String {
    let joined = chunks.join(CHUNK_SEPARATOR);
    format!(
        "You are a helpful study assistant.\n\
         \n\
         Use ONLY the following notes to answer the question.\n\
         If the answer is not found, say: \"{REFUSAL}\"\n\
         \n\
         Notes:\n\
         {joined}\n\
         \n\
         Question: {question}\n\
         \n\
         Answer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_question_and_chunks() {
        let chunks = vec!["alpha notes".to_string(), "beta notes".to_string()];
        let prompt = build_prompt("what is alpha?", &chunks);
        assert!(prompt.contains("what is alpha?"));
        assert!(prompt.contains("alpha notes"));
        assert!(prompt.contains("beta notes"));
        assert!(prompt.contains(REFUSAL));
    }

    #[test]
    fn test_chunks_are_separated() {
        let chunks = vec!["one".to_string(), "two".to_string()];
        let prompt = build_prompt("q", &chunks);
        assert!(prompt.contains("one\n\n---\n\ntwo"));
    }

    #[test]
    fn test_empty_context_still_renders() {
        let prompt = build_prompt("q", &[]);
        assert!(prompt.contains("Question: q"));
    }
}
