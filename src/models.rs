use serde::{Deserialize, Serialize};

use crate::formatter;
use crate::pipeline::prompt::Turn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, r#type: &str, code: &str) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                r#type: r#type.to_string(),
                code: Some(code.to_string()),
            },
        }
    }
}

/// Body of `POST /v1/chat/respond`. The caller owns the conversation and
/// sends it whole; `message`, if given, is appended as the newest user turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RespondRequest {
    #[serde(default)]
    pub messages: Vec<Turn>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub format: ResponseFormat,
}

/// How the sanitized reply is rendered for the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Markdown,
    Plain,
    Html,
}

impl ResponseFormat {
    pub fn render(self, sanitized: String) -> String {
        match self {
            ResponseFormat::Markdown => sanitized,
            ResponseFormat::Plain => formatter::clean_plain_text(&sanitized),
            ResponseFormat::Html => formatter::markdown_to_display(&sanitized),
        }
    }
}

impl RespondRequest {
    pub fn into_history(self) -> Vec<Turn> {
        let mut history = self.messages;
        if let Some(message) = self.message {
            history.push(Turn::user(message));
        }
        history
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondResponse {
    pub response: String,
    pub model: String,
}
