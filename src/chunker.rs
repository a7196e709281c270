/// Word-window chunker for course notes.
///
/// Splits raw document text into overlapping fixed-size word windows, the
/// unit of retrieval for the vector store.
use thiserror::Error;

/// Default window size in words.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default overlap between consecutive windows, in words.
pub const DEFAULT_OVERLAP: usize = 50;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChunkError {
    #[error("overlap ({overlap}) must be smaller than chunk_size ({chunk_size})")]
    InvalidOverlap { chunk_size: usize, overlap: usize },

    #[error("chunk_size must be positive")]
    ZeroChunkSize,
}

/// Split `text` into overlapping word windows.
///
/// Each window holds `chunk_size` whitespace-separated words and the window
/// start advances by `chunk_size - overlap` words per step, so consecutive
/// chunks share their boundary words. The final window keeps all remaining
/// words even when shorter than `chunk_size`.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>, ChunkError> {
    if chunk_size == 0 {
        return Err(ChunkError::ZeroChunkSize);
    }
    if overlap >= chunk_size {
        // The step size must stay positive or the loop never advances.
        return Err(ChunkError::InvalidOverlap {
            chunk_size,
            overlap,
        });
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let step = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

/// Chunk with the default window size and overlap.
pub fn chunk_text_default(text: &str) -> Result<Vec<String>, ChunkError> {
    chunk_text(text, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP)
}

// ── Tests ────────────────────────────────────────────────────────────
