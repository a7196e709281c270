//! Course registry: maps a course code to its notes folder, its persisted
//! index, and a process-lifetime cache of loaded [`VectorStore`]s.
//!
//! Course codes are canonicalized (trimmed, upper-cased, defaulted) in one
//! place so every entry surface — HTTP, CLI, tests — agrees on cache-key
//! identity. The cache map is the only shared mutable state in the crate;
//! builds of the same course are serialized by a per-course lock while
//! distinct courses build independently.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::chunker::{self, ChunkError};
use crate::config::Config;
use crate::embedder::{Embedder, EmbedderError};
use crate::loader;
use crate::store::{StoreError, VectorStore};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("no chunks produced from notes for course {0}")]
    EmptyCorpus(String),

    #[error("failed to load notes: {0}")]
    Notes(String),

    #[error(transparent)]
    Chunk(#[from] ChunkError),

    #[error(transparent)]
    Embed(#[from] EmbedderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Snapshot of a course's state, as reported by `/courses/{code}`.
#[derive(Debug, Clone, Serialize)]
pub struct CourseInfo {
    pub course_code: String,
    pub indexed: bool,
    pub loaded: bool,
    pub chunk_count: Option<usize>,
    pub notes_path: String,
    pub notes_exist: bool,
}

pub struct CourseRegistry {
    config: Config,
    cache: RwLock<HashMap<String, Arc<VectorStore>>>,
    build_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CourseRegistry {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cache: RwLock::new(HashMap::new()),
            build_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Canonical course code: trimmed and upper-cased, with the configured
    /// default substituted for a missing or blank input.
    pub fn canonical_course(&self, course: Option<&str>) -> String {
        match course.map(str::trim) {
            Some(c) if !c.is_empty() => c.to_uppercase(),
            _ => self.config.default_course.trim().to_uppercase(),
        }
    }

    /// Notes directory for a course: `<notes_base_dir>/<CODE>`.
    pub fn notes_path(&self, course: &str) -> PathBuf {
        Path::new(&self.config.notes_base_dir).join(self.canonical_course(Some(course)))
    }

    /// Index path prefix for a course: `<index_base_dir>/<code_lowercase>`.
    ///
    /// Ensures the index base directory exists as a side effect.
    pub fn index_path(&self, course: &str) -> Result<PathBuf, RegistryError> {
        fs::create_dir_all(&self.config.index_base_dir)?;
        let name = self.canonical_course(Some(course)).to_lowercase();
        Ok(Path::new(&self.config.index_base_dir).join(name))
    }

    /// Sorted course codes found as subdirectories of the notes base.
    /// An absent base directory yields an empty list, not an error.
    pub fn list_available(&self) -> Vec<String> {
        let base = Path::new(&self.config.notes_base_dir);
        let Ok(entries) = fs::read_dir(base) else {
            warn!("notes directory not found: {}", base.display());
            return Vec::new();
        };

        let mut courses: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        courses.sort();
        courses
    }

    /// Whether both persisted artifacts exist for the course.
    pub fn is_indexed(&self, course: &str) -> bool {
        self.index_path(course)
            .map(|p| VectorStore::exists(&p))
            .unwrap_or(false)
    }

    pub fn get_cached(&self, course: &str) -> Option<Arc<VectorStore>> {
        let key = self.canonical_course(Some(course));
        self.cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .cloned()
    }

    pub fn set_cached(&self, course: &str, store: Arc<VectorStore>) {
        let key = self.canonical_course(Some(course));
        self.cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.clone(), store);
        info!("cached course store for {key}");
    }

    /// Evict one course from the cache, or every course when `None`.
    pub fn evict(&self, course: Option<&str>) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        match course {
            Some(c) => {
                let key = self.canonical_course(Some(c));
                if cache.remove(&key).is_some() {
                    info!("cleared cache for course {key}");
                }
            }
            None => {
                cache.clear();
                info!("cleared all course caches");
            }
        }
    }

    /// Sorted codes of courses currently held in the cache.
    pub fn loaded_courses(&self) -> Vec<String> {
        let mut codes: Vec<String> = self
            .cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        codes.sort();
        codes
    }

    /// Return the course's store from cache or disk.
    ///
    /// A missing persisted index is an expected absence (`Ok(None)`), not an
    /// error; anything else — a torn artifact, an IO failure — propagates.
    pub fn resolve(&self, course: &str) -> Result<Option<Arc<VectorStore>>, RegistryError> {
        if let Some(store) = self.get_cached(course) {
            return Ok(Some(store));
        }

        let prefix = self.index_path(course)?;
        match VectorStore::load(&prefix) {
            Ok(store) => {
                let store = Arc::new(store);
                self.set_cached(course, store.clone());
                Ok(Some(store))
            }
            Err(StoreError::NotFound(_)) => {
                warn!(
                    "no index found for course {}",
                    self.canonical_course(Some(course))
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Load the course's store, building it from the notes folder when no
    /// persisted index exists.
    ///
    /// The build path: load raw texts, chunk, embed, populate a fresh store
    /// sized to the embedding dimension, persist (best-effort), cache.
    /// Builds of the same course are serialized; other courses are free to
    /// build concurrently.
    pub fn build_or_load(
        &self,
        notes_dir: &Path,
        index_prefix: &Path,
        course: &str,
        embedder: &dyn Embedder,
    ) -> Result<Arc<VectorStore>, RegistryError> {
        let code = self.canonical_course(Some(course));
        let lock = self.build_lock(&code);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(store) = self.resolve(&code)? {
            return Ok(store);
        }

        info!("building index for course {code} from {}", notes_dir.display());

        let texts =
            loader::load_texts(notes_dir).map_err(|e| RegistryError::Notes(format!("{e:#}")))?;

        let mut chunks = Vec::new();
        for text in &texts {
            chunks.extend(chunker::chunk_text(
                text,
                self.config.chunk_size,
                self.config.chunk_overlap,
            )?);
        }
        if chunks.is_empty() {
            return Err(RegistryError::EmptyCorpus(code));
        }

        let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let vectors = embedder.embed_batch(&refs)?;

        // Size the store to what the embedding actually produced.
        let dim = vectors.first().map(Vec::len).unwrap_or(0);
        let mut store = VectorStore::new(dim)?;
        store.add(vectors, chunks)?;

        // Persistence is an optimization: the in-memory store stays usable
        // for this process even when the save fails.
        if let Err(e) = store.save(index_prefix) {
            warn!("failed to persist index for {code}: {e}");
        }

        let store = Arc::new(store);
        self.set_cached(&code, store.clone());
        info!("course {code} ready with {} chunks", store.len());
        Ok(store)
    }

    /// Build (or load) a course using its configured paths.
    pub fn build_course(
        &self,
        course: &str,
        embedder: &dyn Embedder,
    ) -> Result<Arc<VectorStore>, RegistryError> {
        let code = self.canonical_course(Some(course));
        let notes = self.notes_path(&code);
        let prefix = self.index_path(&code)?;
        self.build_or_load(&notes, &prefix, &code, embedder)
    }

    pub fn course_info(&self, course: &str) -> CourseInfo {
        let code = self.canonical_course(Some(course));
        let store = self.get_cached(&code);
        let notes_path = self.notes_path(&code);

        CourseInfo {
            indexed: self.is_indexed(&code),
            loaded: store.is_some(),
            chunk_count: store.map(|s| s.len()),
            notes_exist: notes_path.exists(),
            notes_path: notes_path.display().to_string(),
            course_code: code,
        }
    }

    fn build_lock(&self, code: &str) -> Arc<Mutex<()>> {
        let mut locks = self.build_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(code.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

// ── Tests ────────────────────────────────────────────────────────────
