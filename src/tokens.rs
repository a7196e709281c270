/// Token estimation and prompt-budget enforcement.
///
/// Uses cheap heuristics rather than a real tokenizer: a word-based estimate
/// (~1.3 tokens per word) and a character-based estimate (~1 token per 4
/// characters). The larger of the two is reported so prompts stay safely
/// under provider limits.
use serde::Serialize;
use tracing::{debug, warn};

/// Characters per token for the character-based heuristic.
const CHARS_PER_TOKEN: usize = 4;

/// Tokens reserved for the system overhead and the generated answer.
pub const RESERVED_TOKENS: usize = 500;

/// Per-model context-window sizes. Unknown models fall back to 4096.
const TOKEN_LIMITS: &[(&str, usize)] = &[
    ("gpt-4o-mini", 128_000),
    ("gpt-4o", 128_000),
    ("gpt-4-turbo", 128_000),
    ("gpt-3.5-turbo", 4096),
];

const FALLBACK_TOKEN_LIMIT: usize = 4096;

/// Prompt-budget diagnostics reported alongside the safety verdict.
#[derive(Debug, Clone, Serialize)]
pub struct TokenBudget {
    pub estimated_tokens: usize,
    pub token_limit: usize,
    pub reserved_tokens: usize,
    pub available_tokens: usize,
    pub safe: bool,
}

/// Estimate the token count of `text`, biased toward over-estimation.
pub fn estimate_tokens(text: &str) -> usize {
    let word_count = text.split_whitespace().count();
    let char_count = text.chars().count();

    let by_words = (word_count as f64 * 1.3) as usize;
    let by_chars = char_count / CHARS_PER_TOKEN;

    by_words.max(by_chars)
}

/// Maximum context-window size for `model`.
pub fn token_limit(model: &str) -> usize {
    TOKEN_LIMITS
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, limit)| *limit)
        .unwrap_or(FALLBACK_TOKEN_LIMIT)
}

/// Greedily keep a prefix of `chunks` whose cumulative estimate stays within
/// `max_tokens`. Stops at the first chunk that would overflow; order is
/// preserved and chunks are never split.
pub fn truncate_chunks_by_tokens(chunks: &[String], max_tokens: usize) -> Vec<String> {
    let mut selected = Vec::new();
    let mut total = 0;

    for (i, chunk) in chunks.iter().enumerate() {
        let chunk_tokens = estimate_tokens(chunk);
        if total + chunk_tokens > max_tokens {
            debug!(
                "token budget reached after {i} chunks ({total}/{max_tokens} tokens)"
            );
            break;
        }
        total += chunk_tokens;
        selected.push(chunk.clone());
    }

    selected
}

/// Check whether `prompt` fits the model's context window once the reserved
/// budget is set aside, and report the numbers behind the verdict.
pub fn is_prompt_safe(prompt: &str, model: &str) -> (bool, TokenBudget) {
    let limit = token_limit(model);
    let estimated = estimate_tokens(prompt);
    let available = limit.saturating_sub(RESERVED_TOKENS);
    let safe = estimated <= available;

    if !safe {
        warn!(
            "prompt may exceed token limit for {model}: {estimated} tokens > {available} available"
        );
    }

    (
        safe,
        TokenBudget {
            estimated_tokens: estimated,
            token_limit: limit,
            reserved_tokens: RESERVED_TOKENS,
            available_tokens: available,
            safe,
        },
    )
}

// ── Tests ────────────────────────────────────────────────────────────
