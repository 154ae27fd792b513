use serde::{Deserialize, Serialize};

/// `{"error": {...}}` body returned on HTTP failures and, occasionally, as a stream frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiErrorEnvelope {
    pub error: GeminiError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiError {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl GeminiError {
    pub fn describe(&self) -> String {
        match &self.status {
            Some(status) if !self.message.is_empty() => format!("{}: {}", status, self.message),
            Some(status) => status.clone(),
            None => self.message.clone(),
        }
    }
}
