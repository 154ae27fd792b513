use crate::error::LlmError;
use crate::pipeline::stream::{StreamEvent, StreamHandle};

/// Concatenates every fragment until the stream ends.
///
/// Resolves on `End`, fails on `Error`; a producer that disappears without
/// either is reported as [`LlmError::StreamClosed`]. No partial text is
/// returned on failure.
pub async fn collect(mut handle: StreamHandle) -> Result<String, LlmError> {
    let mut full = String::new();
    while let Some(event) = handle.next_event().await {
        match event {
            StreamEvent::Fragment(text) => full.push_str(&text),
            StreamEvent::End => return Ok(full),
            StreamEvent::Error(e) => return Err(e),
        }
    }
    Err(LlmError::StreamClosed)
}
