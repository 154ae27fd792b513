use serde::{Deserialize, Serialize};

use crate::converters::gemini::GeminiContent;
use crate::converters::gemini::gemini_content::{ROLE_MODEL, ROLE_USER};

/// Directive sent ahead of every conversation.
pub const SYSTEM_PROMPT: &str = include_str!("system_prompt.md");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// The backend has no assistant role; model turns are `"model"`.
    pub fn provider_role(self) -> &'static str {
        match self {
            Role::User => ROLE_USER,
            Role::Assistant => ROLE_MODEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    #[cfg(test)]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// The ordered turns actually sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrompt {
    contents: Vec<GeminiContent>,
}

impl ComposedPrompt {
    /// Directive first, then the history in order.
    pub fn contents(&self) -> &[GeminiContent] {
        &self.contents
    }
}

/// Prepends the system directive as a user turn, then maps each turn in order.
/// Contents are copied verbatim; filtering empty turns is the caller's job.
pub fn compose(history: &[Turn]) -> ComposedPrompt {
    let mut contents = Vec::with_capacity(history.len() + 1);
    // No system slot in the streamed contents; the directive rides as the first user turn.
    contents.push(GeminiContent::text(ROLE_USER, SYSTEM_PROMPT));
    contents.extend(
        history
            .iter()
            .map(|turn| GeminiContent::text(turn.role.provider_role(), turn.content.clone())),
    );
    ComposedPrompt { contents }
}
