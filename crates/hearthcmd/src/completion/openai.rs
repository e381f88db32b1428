use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::CompletionError;
use super::CompletionRequest;
use super::CompletionService;
use crate::config::CompletionConfig;

/// Longest error body kept in a `CompletionError::Status`
const MAX_ERROR_BODY: usize = 512;

/// Request body for an OpenAI-compatible `/v1/completions` endpoint
#[derive(Serialize)]
struct CompletionsBody<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

/// Response envelope (only the fields we need)
#[derive(Deserialize)]
struct CompletionsResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    text: String,
}

/// Client for an OpenAI-compatible text completion endpoint
pub struct OpenAiCompletion {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompletion {
    pub fn new(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key(),
        })
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = CompletionsBody {
            model: &self.model,
            prompt: &request.prompt,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: truncate(body, MAX_ERROR_BODY),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;
        let text = parse_envelope(&bytes)?;
        debug!("Completion returned {} bytes of text", text.len());
        Ok(text)
    }
}

/// Extract the generated text from the response envelope.
fn parse_envelope(bytes: &[u8]) -> Result<String, CompletionError> {
    let envelope: CompletionsResponse =
        serde_json::from_slice(bytes).map_err(|e| CompletionError::Envelope(e.to_string()))?;

    envelope
        .choices
        .into_iter()
        .next()
        .map(|c| c.text)
        .ok_or_else(|| CompletionError::Envelope("response has no choices".to_string()))
}

fn truncate(mut s: String, max: usize) -> String {
    if s.len() > max {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
    }
    s
}
