/// Failures of a chat-completion call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// No API key was available; no request was sent.
    #[error("no Perplexity API key configured")]
    MissingCredential,

    /// Network failure, timeout, or a non-2xx status.
    #[error("request failed: {0}")]
    Transport(String),

    /// The reply arrived but did not have the expected shape.
    #[error("unexpected response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    /// Transport and malformed-response failures are reported the same way.
    pub fn is_request_error(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::MalformedResponse(_))
    }
}
