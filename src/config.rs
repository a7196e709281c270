/// Configuration module for studyrag.
///
/// Handles loading, validating, and providing default configuration values.
/// A JSON config file provides the base; environment variables override the
/// deployment-specific fields (paths, default course, API credentials).
use std::collections::HashMap;
use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ── Default value functions ──────────────────────────────────────────

fn default_notes_base_dir() -> String {
    "data/notes".to_string()
}

fn default_index_base_dir() -> String {
    "data/index".to_string()
}

fn default_course() -> String {
    "COMP2123".to_string()
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    50
}

fn default_search_top_k() -> usize {
    3
}

fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

// ── Config struct ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Base directory containing one subdirectory of notes per course.
    #[serde(default = "default_notes_base_dir")]
    pub notes_base_dir: String,

    /// Base directory for persisted index artifacts.
    #[serde(default = "default_index_base_dir")]
    pub index_base_dir: String,

    /// Course assumed when a request names none.
    #[serde(default = "default_course")]
    pub default_course: String,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,

    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    /// Extra per-model token limits, merged over the built-in table.
    #[serde(default)]
    pub token_limits: HashMap<String, usize>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API key for the embedding/generation service. Empty means the mock
    /// implementations are used instead of remote calls.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notes_base_dir: default_notes_base_dir(),
            index_base_dir: default_index_base_dir(),
            default_course: default_course(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            search_top_k: default_search_top_k(),
            generation_model: default_generation_model(),
            token_limits: HashMap::new(),
            api_base: default_api_base(),
            api_key: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file, then apply environment overrides.
    ///
    /// If `config_path` is empty, defaults to `"config.json"`. A missing
    /// file is not an error; the defaults (plus env) are used.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        let mut cfg = if Path::new(path).exists() {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {path}"))?;
            match serde_json::from_str(&data) {
                Ok(c) => {
                    info!("Loaded configuration from {path}");
                    c
                }
                Err(e) => {
                    warn!("Invalid JSON in {path}: {e}");
                    warn!("Using default configuration");
                    Self::default()
                }
            }
        } else {
            info!("{path} not found, using defaults");
            Self::default()
        };

        cfg.apply_env();
        Ok(cfg)
    }

    /// Override deployment-specific fields from environment variables.
    pub fn apply_env(&mut self) {
        if let Ok(v) = env::var("NOTES_BASE_DIR") {
            self.notes_base_dir = v;
        }
        if let Ok(v) = env::var("INDEX_BASE_DIR") {
            self.index_base_dir = v;
        }
        if let Ok(v) = env::var("DEFAULT_COURSE") {
            self.default_course = v;
        }
        if let Ok(v) = env::var("GENERATION_MODEL") {
            self.generation_model = v;
        }
        if let Ok(v) = env::var("OPENAI_API_BASE") {
            self.api_base = v;
        }
        if let Ok(v) = env::var("OPENAI_API_KEY") {
            self.api_key = v;
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.chunk_size > 0, "chunk_size must be positive");
        anyhow::ensure!(
            self.chunk_overlap < self.chunk_size,
            "chunk_overlap must be smaller than chunk_size"
        );
        anyhow::ensure!(self.search_top_k > 0, "search_top_k must be positive");
        anyhow::ensure!(
            !self.default_course.trim().is_empty(),
            "default_course must not be empty"
        );
        anyhow::ensure!(
            self.request_timeout_secs > 0,
            "request_timeout_secs must be positive"
        );
        Ok(())
    }

    /// Token limit for `model`: the config table first, then the built-in one.
    #[must_use]
    pub fn token_limit(&self, model: &str) -> usize {
        self.token_limits
            .get(model)
            .copied()
            .unwrap_or_else(|| crate::tokens::token_limit(model))
    }
}

// ── Tests ────────────────────────────────────────────────────────────
