//! Exact-search vector store pairing embeddings with text chunks.
//!
//! An append-only flat index: every stored vector has the same dimension and
//! sits at the same position as its source chunk. Search is an exhaustive
//! squared-Euclidean scan — exact results, no approximation, fine at
//! course-notes scale.
//!
//! Persistence writes two co-located artifacts under one path prefix:
//!   - `<prefix>.index`       binary vector data (header + f32 LE payload)
//!   - `<prefix>_texts.json`  the parallel chunk sequence

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

/// Magic bytes at the head of the `.index` artifact.
const INDEX_MAGIC: &[u8; 4] = b"SRG1";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("dimension must be a positive integer")]
    InvalidDimension,

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("vector/chunk count mismatch: {vectors} vectors, {chunks} chunks")]
    CountMismatch { vectors: usize, chunks: usize },

    #[error("no persisted index at {0}")]
    NotFound(PathBuf),

    #[error("corrupt index artifact: {0}")]
    Corrupt(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("chunk serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flat vector index plus the parallel chunk texts.
///
/// Invariant: `vectors.len() == chunks.len()` and every vector has exactly
/// `dim` components. Entries are append-only; a rebuild replaces the whole
/// store.
#[derive(Debug)]
pub struct VectorStore {
    dim: usize,
    vectors: Vec<Vec<f32>>,
    chunks: Vec<String>,
}

impl VectorStore {
    /// Create an empty store for `dim`-dimensional vectors.
    pub fn new(dim: usize) -> Result<Self, StoreError> {
        if dim == 0 {
            return Err(StoreError::InvalidDimension);
        }
        Ok(Self {
            dim,
            vectors: Vec::new(),
            chunks: Vec::new(),
        })
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Vector dimensionality, fixed at creation or load time.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Append vectors and their source chunks.
    ///
    /// All-or-nothing: inputs are validated in full before either sequence
    /// is touched, so a failed call leaves the store unchanged.
    pub fn add(&mut self, vectors: Vec<Vec<f32>>, chunks: Vec<String>) -> Result<(), StoreError> {
        if vectors.len() != chunks.len() {
            return Err(StoreError::CountMismatch {
                vectors: vectors.len(),
                chunks: chunks.len(),
            });
        }
        for v in &vectors {
            if v.len() != self.dim {
                return Err(StoreError::DimensionMismatch {
                    expected: self.dim,
                    actual: v.len(),
                });
            }
        }

        self.vectors.extend(vectors);
        self.chunks.extend(chunks);
        Ok(())
    }

    /// Return up to `top_k` chunks ordered by ascending squared-Euclidean
    /// distance to `query` (nearest first).
    ///
    /// Returns fewer than `top_k` when the store holds fewer entries. A
    /// candidate index outside the chunk sequence is dropped rather than
    /// turned into an out-of-bounds failure.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<String>, StoreError> {
        if query.len() != self.dim {
            return Err(StoreError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, squared_l2(query, v)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));

        Ok(scored
            .into_iter()
            .take(top_k)
            .filter_map(|(i, _)| self.chunks.get(i).cloned())
            .collect())
    }

    /// Persist both artifacts under `prefix`, creating the parent directory.
    ///
    /// Each artifact is written to a temporary sibling and renamed into
    /// place, so a crash mid-write never leaves a torn file behind.
    pub fn save<P: AsRef<Path>>(&self, prefix: P) -> Result<(), StoreError> {
        let prefix = prefix.as_ref();
        if let Some(parent) = prefix.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let index_file = index_file(prefix);
        let texts_file = texts_file(prefix);

        write_atomic(&index_file, &self.encode_vectors())?;
        write_atomic(&texts_file, &serde_json::to_vec(&self.chunks)?)?;

        info!(
            "saved index: {} ({} vectors, dim {})",
            index_file.display(),
            self.vectors.len(),
            self.dim
        );
        Ok(())
    }

    /// Load a previously saved store from `prefix`.
    ///
    /// The dimension is read back from the vector artifact; both artifacts
    /// must exist or the result is [`StoreError::NotFound`].
    pub fn load<P: AsRef<Path>>(prefix: P) -> Result<Self, StoreError> {
        let prefix = prefix.as_ref();
        let index_file = index_file(prefix);
        let texts_file = texts_file(prefix);

        if !index_file.exists() || !texts_file.exists() {
            return Err(StoreError::NotFound(prefix.to_path_buf()));
        }

        let (dim, vectors) = decode_vectors(&fs::read(&index_file)?)?;
        let chunks: Vec<String> = serde_json::from_slice(&fs::read(&texts_file)?)?;

        if vectors.len() != chunks.len() {
            return Err(StoreError::Corrupt(format!(
                "{} vectors but {} chunks at {}",
                vectors.len(),
                chunks.len(),
                prefix.display()
            )));
        }

        info!(
            "loaded index: {} ({} chunks, dim {})",
            prefix.display(),
            chunks.len(),
            dim
        );
        Ok(Self {
            dim,
            vectors,
            chunks,
        })
    }

    /// Check whether both persisted artifacts exist under `prefix`.
    pub fn exists<P: AsRef<Path>>(prefix: P) -> bool {
        let prefix = prefix.as_ref();
        index_file(prefix).exists() && texts_file(prefix).exists()
    }

    /// Remove both persisted artifacts, returning the paths actually removed.
    pub fn remove_files<P: AsRef<Path>>(prefix: P) -> Result<Vec<PathBuf>, StoreError> {
        let prefix = prefix.as_ref();
        let mut removed = Vec::new();
        for path in [index_file(prefix), texts_file(prefix)] {
            if path.exists() {
                fs::remove_file(&path)?;
                removed.push(path);
            }
        }
        Ok(removed)
    }

    fn encode_vectors(&self) -> Vec<u8> {
        let flat: Vec<f32> = self.vectors.iter().flatten().copied().collect();
        let payload: &[u8] = bytemuck::cast_slice(&flat);

        let mut out = Vec::with_capacity(12 + payload.len());
        out.extend_from_slice(INDEX_MAGIC);
        out.extend_from_slice(&(self.dim as u32).to_le_bytes());
        out.extend_from_slice(&(self.vectors.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }
}

fn index_file(prefix: &Path) -> PathBuf {
    append_to_file_name(prefix, ".index")
}

fn texts_file(prefix: &Path) -> PathBuf {
    append_to_file_name(prefix, "_texts.json")
}

fn append_to_file_name(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    prefix.with_file_name(name)
}

fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp = append_to_file_name(path, ".tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)
}

fn decode_vectors(data: &[u8]) -> Result<(usize, Vec<Vec<f32>>), StoreError> {
    if data.len() < 12 || &data[..4] != INDEX_MAGIC {
        return Err(StoreError::Corrupt("bad index header".to_string()));
    }

    let dim = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
    let count = u32::from_le_bytes([data[8], data[9], data[10], data[11]]) as usize;
    if dim == 0 {
        return Err(StoreError::Corrupt("zero dimension in header".to_string()));
    }

    let payload = &data[12..];
    let expected_len = dim * count * std::mem::size_of::<f32>();
    if payload.len() != expected_len {
        return Err(StoreError::Corrupt(format!(
            "payload is {} bytes, header implies {expected_len}",
            payload.len()
        )));
    }

    // pod_collect_to_vec copies, so the payload slice need not be f32-aligned.
    let flat: Vec<f32> = bytemuck::pod_collect_to_vec(payload);
    let vectors = flat.chunks_exact(dim).map(<[f32]>::to_vec).collect();
    Ok((dim, vectors))
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

// ── Tests ────────────────────────────────────────────────────────────
