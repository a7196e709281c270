/// OpenAI-compatible HTTP embedder.
///
/// Talks to any `/v1/embeddings`-shaped endpoint with a bounded request
/// timeout. Failures are classified so callers can tell auth problems from
/// rate limits from transient API errors.
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Embedder, EmbedderError};

/// Default embedding model served by the OpenAI API.
const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Dimensionality of `text-embedding-3-small` vectors.
const DEFAULT_DIMENSIONS: usize = 1536;

pub struct OpenAiEmbedder {
    client: reqwest::blocking::Client,
    api_base: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(
        api_base: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, EmbedderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbedderError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
        })
    }

    pub fn with_model(mut self, model: &str, dimensions: usize) -> Self {
        self.model = model.to_string();
        self.dimensions = dimensions;
        self
    }

    fn request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let url = format!("{}/v1/embeddings", self.api_base);
        debug!("embedding {} texts via {url}", texts.len());

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    EmbedderError::Timeout
                } else {
                    EmbedderError::RequestFailed(e.to_string())
                }
            })?;

        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(EmbedderError::Auth),
            StatusCode::TOO_MANY_REQUESTS => return Err(EmbedderError::RateLimited),
            status if !status.is_success() => {
                return Err(EmbedderError::RequestFailed(format!(
                    "embedding API returned status {status}"
                )));
            }
            _ => {}
        }

        let body: EmbeddingResponse = resp
            .json()
            .map_err(|e| EmbedderError::BadResponse(e.to_string()))?;

        if body.data.len() != texts.len() {
            return Err(EmbedderError::BadResponse(format!(
                "asked for {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }

        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let mut vectors = self.request(&[text])?;
        vectors
            .pop()
            .ok_or_else(|| EmbedderError::BadResponse("empty embedding response".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
