//! Chat-completion providers.

pub mod perplexity;

use shared::agent_api::ChatMessage;
use shared::error::ApiError;
use shared::models::PerplexityModel;

pub use perplexity::PerplexityClient;

/// One completion call: the model plus the instruction-prefixed history.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: PerplexityModel,
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    /// Prefix `history` with a system message carrying `instructions`.
    pub fn new(model: PerplexityModel, instructions: &str, history: &[ChatMessage]) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(instructions));
        messages.extend_from_slice(history);
        Self { model, messages }
    }
}

/// Anything that can turn a [`CompletionRequest`] into reply text.
///
/// Uses async_trait so the chat page can hold an `Arc<dyn CompletionClient>`.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Fails with [`ApiError::MissingCredential`] before any network traffic
    /// when `api_key` is absent or empty.
    async fn complete(
        &self,
        request: CompletionRequest,
        api_key: Option<&str>,
    ) -> Result<String, ApiError>;
}
