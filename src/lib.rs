//! # studyrag — course-notes RAG service
//!
//! Retrieval-augmented question answering over course-note documents: each
//! course's notes (text/markdown/PDF) are chunked, embedded, and indexed in
//! an exact-search vector store; questions are answered by retrieving the
//! nearest chunks and composing them into a token-budgeted prompt for a
//! generation model.
//!
//! ## Architecture
//!
//! - **[`config`]** — Configuration file loading, env overrides, validation
//! - **[`loader`]** — Raw text extraction from .txt/.md/.pdf note files
//! - **[`chunker`]** — Overlapping word-window chunking
//! - **[`tokens`]** — Token estimation and prompt-budget enforcement
//! - **[`store`]** — Flat vector index with two-artifact persistence
//! - **[`courses`]** — Per-course index lifecycle (load/build/cache/evict)
//! - **[`embedder`]** — Text embedding behind a narrow trait (OpenAI or mock)
//! - **[`generator`]** — Answer generation behind a narrow trait (OpenAI or mock)
//! - **[`prompt`]** — Grounded-answer prompt template
//! - **[`qa`]** — Retrieval-answer orchestration, string results on every path
//! - **[`server`]** — Thin axum HTTP surface

pub mod chunker;
pub mod config;
pub mod courses;
pub mod embedder;
pub mod generator;
pub mod loader;
pub mod prompt;
pub mod qa;
pub mod server;
pub mod store;
pub mod tokens;
