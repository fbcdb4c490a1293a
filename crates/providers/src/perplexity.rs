use crate::{CompletionClient, CompletionRequest};
use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::agent_api::ChatMessage;
use shared::error::ApiError;
use std::time::Duration;

pub const PERPLEXITY_CHAT_URL: &str = "https://api.perplexity.ai/chat/completions";

pub const MAX_TOKENS: u32 = 4000;
pub const TEMPERATURE: f64 = 0.2;
pub const TOP_P: f64 = 0.9;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PerplexityRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct PerplexityResponse {
    #[serde(default)]
    choices: Vec<PerplexityChoice>,
}

#[derive(Debug, Deserialize)]
struct PerplexityChoice {
    message: PerplexityMessage,
}

#[derive(Debug, Deserialize)]
struct PerplexityMessage {
    #[serde(default)]
    content: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

pub struct PerplexityClient {
    http: Client,
    endpoint: String,
}

impl PerplexityClient {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(PERPLEXITY_CHAT_URL)
    }

    /// Client posting to `endpoint` instead of the public API.
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        // Each request may run on a fresh runtime, so pooled connections
        // would outlive the runtime that spawned them.
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl CompletionClient for PerplexityClient {
    async fn complete(
        &self,
        request: CompletionRequest,
        api_key: Option<&str>,
    ) -> Result<String, ApiError> {
        let api_key = match api_key.map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => return Err(ApiError::MissingCredential),
        };

        let body = PerplexityRequest {
            model: request.model.as_str(),
            messages: &request.messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            stream: false,
        };
        tracing::debug!(
            model = body.model,
            messages = body.messages.len(),
            "sending chat completion"
        );

        let resp = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            let detail: String = text.trim().chars().take(800).collect();
            tracing::warn!(%status, "perplexity returned an error status");
            if detail.is_empty() {
                return Err(ApiError::Transport(format!("perplexity error: {}", status)));
            }
            return Err(ApiError::Transport(format!(
                "perplexity error: {}\n{}",
                status, detail
            )));
        }

        extract_reply(&text)
    }
}

/// `choices[0].message.content` of a success body.
fn extract_reply(body: &str) -> Result<String, ApiError> {
    let parsed: PerplexityResponse =
        serde_json::from_str(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| {
            ApiError::MalformedResponse("reply has no choices[0].message.content".to_string())
        })
}
