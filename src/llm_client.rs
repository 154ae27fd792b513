use bytes::Bytes;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::converters::gemini::{ChunkShape, GeminiErrorEnvelope, GeminiRequest, GeminiStreamFrame};
use crate::converters::sse::SseDecoder;
use crate::error::LlmError;
use crate::pipeline::stream::{ChunkStream, GenerativeBackend};

/// Gemini `streamGenerateContent` over a shared HTTP client.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http_client: Arc<reqwest::Client>,
    api_base: String,
}

impl LlmClient {
    pub fn new(http_client: Arc<reqwest::Client>, api_base: impl Into<String>) -> Self {
        Self { http_client, api_base: api_base.into() }
    }

    fn build_target_url(&self, model: &str) -> String {
        let path = format!("models/{}:streamGenerateContent?alt=sse", model);
        if self.api_base.ends_with('/') {
            format!("{}{}", self.api_base, path)
        } else {
            format!("{}/{}", self.api_base, path)
        }
    }
}

impl GenerativeBackend for LlmClient {
    async fn stream_generate(
        &self,
        credential: &str,
        model: &str,
        request: GeminiRequest,
    ) -> Result<ChunkStream, LlmError> {
        let target_url = self.build_target_url(model);
        info!("Forwarding request to: {}", target_url);
        debug!(
            "request body: {}",
            serde_json::to_string(&request).unwrap_or_default()
        );

        let response = self
            .http_client
            .post(&target_url)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .header("x-goog-api-key", credential)
            .json(&request)
            .send()
            .await?;

        // Non-2xx: surface Gemini's own error message when the body carries one
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Streaming request failed with status {}: {}", status, error_text);
            let message = serde_json::from_str::<GeminiErrorEnvelope>(&error_text)
                .map(|envelope| envelope.error.describe())
                .unwrap_or(error_text);
            return Err(LlmError::Backend { status: Some(status.as_u16()), message });
        }

        Ok(decode_event_stream(response.bytes_stream()).boxed())
    }
}

struct DecodeState {
    inner: BoxStream<'static, Result<Bytes, LlmError>>,
    decoder: SseDecoder,
    ready: VecDeque<Result<ChunkShape, LlmError>>,
    done: bool,
}

/// Turns an SSE byte stream into decoded chunks. The stream ends right after
/// the first error it yields.
pub fn decode_event_stream<S, E>(inner: S) -> impl Stream<Item = Result<ChunkShape, LlmError>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<LlmError> + 'static,
{
    let state = DecodeState {
        inner: inner.map(|r| r.map_err(Into::into)).boxed(),
        decoder: SseDecoder::new(),
        ready: VecDeque::new(),
        done: false,
    };

    // Drain decoded frames before pulling more bytes; one network read may hold several
    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.ready.pop_front() {
                if item.is_err() {
                    st.ready.clear();
                    st.done = true;
                }
                return Some((item, st));
            }
            if st.done {
                return None;
            }
            match st.inner.next().await {
                Some(Ok(bytes)) => {
                    for data in st.decoder.push(&bytes) {
                        st.ready.push_back(parse_frame(&data));
                    }
                }
                Some(Err(e)) => {
                    st.done = true;
                    st.ready.push_back(Err(e));
                }
                None => {
                    st.done = true;
                    if let Some(data) = st.decoder.finish() {
                        st.ready.push_back(parse_frame(&data));
                    }
                }
            }
        }
    })
}

fn parse_frame(data: &str) -> Result<ChunkShape, LlmError> {
    match serde_json::from_str::<GeminiStreamFrame>(data)? {
        GeminiStreamFrame::Chunk(chunk) => Ok(chunk),
        GeminiStreamFrame::Error(envelope) => Err(LlmError::Backend {
            status: envelope.error.code,
            message: envelope.error.describe(),
        }),
    }
}
