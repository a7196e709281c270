//! HTTP service surface.
//!
//! A thin axum layer over the QA engine and the course registry: request
//! parsing and JSON shaping only, no retrieval logic. Engine and registry
//! calls block on file IO and external APIs, so handlers run them on the
//! blocking pool.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::info;

use crate::qa::QaEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QaEngine>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ask", get(ask))
        .route("/courses", get(list_courses))
        .route("/courses/:code", get(course_info))
        .route("/courses/:code/reload", post(reload_course))
        .route("/health", get(health))
        .with_state(state)
}

/// Serve the API on `addr` until the process is stopped.
pub async fn serve(state: AppState, addr: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("listening on {addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[derive(Deserialize)]
struct AskParams {
    q: String,
    course: Option<String>,
}

async fn ask(State(state): State<AppState>, Query(params): Query<AskParams>) -> Json<Value> {
    let engine = state.engine.clone();
    let answer = tokio::task::spawn_blocking(move || {
        engine.answer_question(&params.q, params.course.as_deref())
    })
    .await
    .unwrap_or_else(|e| format!("Internal error while answering: {e}"));

    Json(json!({ "answer": answer }))
}

async fn list_courses(State(state): State<AppState>) -> Json<Value> {
    let engine = state.engine.clone();
    let (default_course, available, loaded) = tokio::task::spawn_blocking(move || {
        let registry = engine.registry();
        (
            registry.config().default_course.clone(),
            registry.list_available(),
            registry.loaded_courses(),
        )
    })
    .await
    .unwrap_or_default();

    Json(json!({
        "default_course": default_course,
        "available_courses": available,
        "loaded_courses": loaded,
    }))
}

async fn course_info(State(state): State<AppState>, Path(code): Path<String>) -> Json<Value> {
    let engine = state.engine.clone();
    let info = tokio::task::spawn_blocking(move || engine.registry().course_info(&code)).await;

    match info {
        Ok(info) => Json(serde_json::to_value(info).unwrap_or_else(|_| json!({}))),
        Err(e) => Json(json!({ "error": format!("internal error: {e}") })),
    }
}

async fn reload_course(State(state): State<AppState>, Path(code): Path<String>) -> Json<Value> {
    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        let registry = engine.registry();
        let course = registry.canonical_course(Some(&code));
        // A reload always rebuilds: drop the cached store and the persisted
        // artifacts so build_or_load takes the full build path.
        registry.evict(Some(&course));
        let prefix = registry.index_path(&course)?;
        crate::store::VectorStore::remove_files(&prefix)?;
        registry
            .build_course(&course, engine.embedder().as_ref())
            .map(|_| (course, prefix))
    })
    .await;

    match result {
        Ok(Ok((course, prefix))) => Json(json!({
            "status": "ok",
            "course": course,
            "index_path": prefix.display().to_string(),
        })),
        Ok(Err(e)) => Json(json!({ "status": "error", "error": e.to_string() })),
        Err(e) => Json(json!({ "status": "error", "error": format!("internal error: {e}") })),
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::courses::CourseRegistry;
    use crate::embedder::mock::MockEmbedder;
    use crate::generator::mock::MockGenerator;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::fs;
    use tempfile::tempdir;
    use tower::ServiceExt;

    fn test_state(temp: &tempfile::TempDir) -> AppState {
        let config = Config {
            notes_base_dir: temp.path().join("notes").display().to_string(),
            index_base_dir: temp.path().join("index").display().to_string(),
            default_course: "COMP2123".to_string(),
            ..Config::default()
        };
        let registry = Arc::new(CourseRegistry::new(config));
        let engine = Arc::new(QaEngine::new(
            registry,
            Arc::new(MockEmbedder::new(8)),
            Arc::new(MockGenerator::new("STUB ANSWER")),
        ));
        AppState { engine }
    }

    fn seed_course(state: &AppState, course: &str) {
        let registry = state.engine.registry();
        let notes = registry.notes_path(course);
        fs::create_dir_all(&notes).unwrap();
        fs::write(notes.join("n1.txt"), "course material ".repeat(100)).unwrap();
        registry
            .build_course(course, state.engine.embedder().as_ref())
            .unwrap();
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let temp = tempdir().unwrap();
        let app = router(test_state(&temp));
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_ask_initialized_course() {
        let temp = tempdir().unwrap();
        let state = test_state(&temp);
        seed_course(&state, "CS101");

        let app = router(state);
        let (status, body) = get_json(app, "/ask?q=what%20is%20sorting&course=cs101").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "STUB ANSWER");
    }

    #[tokio::test]
    async fn test_ask_uninitialized_course() {
        let temp = tempdir().unwrap();
        let app = router(test_state(&temp));
        let (status, body) = get_json(app, "/ask?q=hello&course=GHOST1").await;
        assert_eq!(status, StatusCode::OK);
        let answer = body["answer"].as_str().unwrap();
        assert!(answer.contains("not initialized"));
    }

    #[tokio::test]
    async fn test_list_courses() {
        let temp = tempdir().unwrap();
        let state = test_state(&temp);
        seed_course(&state, "CS101");

        let app = router(state);
        let (_, body) = get_json(app, "/courses").await;
        assert_eq!(body["default_course"], "COMP2123");
        assert_eq!(body["available_courses"][0], "CS101");
        assert_eq!(body["loaded_courses"][0], "CS101");
    }

    #[tokio::test]
    async fn test_course_info() {
        let temp = tempdir().unwrap();
        let state = test_state(&temp);
        seed_course(&state, "CS101");

        let app = router(state);
        let (_, body) = get_json(app, "/courses/cs101").await;
        assert_eq!(body["course_code"], "CS101");
        assert_eq!(body["indexed"], true);
        assert_eq!(body["loaded"], true);
        assert!(body["chunk_count"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_reload_course() {
        let temp = tempdir().unwrap();
        let state = test_state(&temp);
        let registry = state.engine.registry();
        let notes = registry.notes_path("CS101");
        fs::create_dir_all(&notes).unwrap();
        fs::write(notes.join("n1.txt"), "fresh notes ".repeat(100)).unwrap();

        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/courses/CS101/reload")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["course"], "CS101");
    }

    #[tokio::test]
    async fn test_reload_missing_notes_is_error_shape() {
        let temp = tempdir().unwrap();
        let app = router(test_state(&temp));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/courses/GHOST1/reload")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "error");
        assert!(body["error"].as_str().is_some());
    }
}
