use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeminiFinishReason {
    FinishReasonUnspecified,
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Language,
    Blocklist,
    ProhibitedContent,
    Spii,
    #[serde(other)]
    Other,
}

impl GeminiFinishReason {
    /// Whether generation ended before the model chose to stop.
    pub fn is_truncation(self) -> bool {
        !matches!(self, GeminiFinishReason::Stop | GeminiFinishReason::FinishReasonUnspecified)
    }
}
