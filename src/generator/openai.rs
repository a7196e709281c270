/// OpenAI-compatible chat-completion generator.
///
/// Single-turn `/v1/chat/completions` calls with a bounded timeout. HTTP
/// status codes map onto the [`GeneratorError`] taxonomy.
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Generator, GeneratorError};

pub struct OpenAiGenerator {
    client: reqwest::blocking::Client,
    api_base: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl OpenAiGenerator {
    pub fn new(
        api_base: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, GeneratorError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeneratorError::Other(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

impl Generator for OpenAiGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let url = format!("{}/v1/chat/completions", self.api_base);
        debug!("requesting completion from {} ({})", url, self.model);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model: &self.model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
            })
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorError::Timeout
                } else {
                    GeneratorError::Other(e.to_string())
                }
            })?;

        let status = resp.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(GeneratorError::Auth),
            StatusCode::TOO_MANY_REQUESTS => return Err(GeneratorError::RateLimited),
            s if !s.is_success() => {
                let message = resp.text().unwrap_or_default();
                return Err(GeneratorError::Api {
                    status: s.as_u16(),
                    message,
                });
            }
            _ => {}
        }

        let body: ChatResponse = resp
            .json()
            .map_err(|e| GeneratorError::Other(format!("bad completion response: {e}")))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GeneratorError::Other("completion had no choices".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
