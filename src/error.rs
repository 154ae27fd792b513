use thiserror::Error;

/// Failures of the response pipeline. Every variant is terminal for the request.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM_API_KEY not configured")]
    MissingCredential,
    /// The model id would not form a single URL path segment.
    #[error("invalid model id: {0:?}")]
    InvalidModel(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Backend { status: Option<u16>, message: String },
    #[error("failed to decode stream chunk: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response stream closed before completion")]
    StreamClosed,
}

impl LlmError {
    /// Errors that come from configuration rather than the backend.
    pub fn is_configuration(&self) -> bool {
        matches!(self, LlmError::MissingCredential)
    }
}
