use serde::Deserialize;
use serde_json::Value;

use crate::converters::gemini::{GeminiCandidate, GeminiErrorEnvelope, GeminiFinishReason, GeminiUsage};

/// One `data:` payload of a `streamGenerateContent?alt=sse` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GeminiStreamFrame {
    Error(GeminiErrorEnvelope),
    Chunk(ChunkShape),
}

/// The shapes a streamed chunk may take. Variants are tried in order, so a
/// payload carrying both a top-level `text` and `candidates` reads as text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChunkShape {
    TextAccessor {
        text: String,
    },
    CandidateList {
        candidates: Vec<GeminiCandidate>,
        #[serde(rename = "usageMetadata")]
        #[serde(default)]
        usage_metadata: Option<GeminiUsage>,
    },
    Unrecognized(Value),
}

impl ChunkShape {
    #[cfg(test)]
    pub fn text(text: impl Into<String>) -> Self {
        ChunkShape::TextAccessor { text: text.into() }
    }

    /// The chunk's text: the accessor value, or `candidates[0].content.parts[0].text`.
    pub fn extract_text(&self) -> Option<&str> {
        match self {
            ChunkShape::TextAccessor { text } => Some(text.as_str()),
            ChunkShape::CandidateList { candidates, .. } => candidates
                .first()
                .and_then(|c| c.content.as_ref())
                .and_then(|content| content.first_text()),
            ChunkShape::Unrecognized(_) => None,
        }
    }

    pub fn finish_reason(&self) -> Option<GeminiFinishReason> {
        match self {
            ChunkShape::CandidateList { candidates, .. } => {
                candidates.first().and_then(|c| c.finish_reason)
            }
            _ => None,
        }
    }

    pub fn usage(&self) -> Option<&GeminiUsage> {
        match self {
            ChunkShape::CandidateList { usage_metadata, .. } => usage_metadata.as_ref(),
            _ => None,
        }
    }
}
