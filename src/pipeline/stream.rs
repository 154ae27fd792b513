use futures::StreamExt;
use futures::stream::BoxStream;
use regex::Regex;
use std::future::Future;
use std::sync::LazyLock;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::config::LlmConfig;
use crate::converters::gemini::{ChunkShape, GeminiGenerationConfig, GeminiRequest};
use crate::error::LlmError;
use crate::pipeline::prompt::ComposedPrompt;

pub type ChunkStream = BoxStream<'static, Result<ChunkShape, LlmError>>;

// Model ids end up as a URL path segment, so `/`, `#`, `?` and `%` never get through.
static MODEL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("Invalid model id regex"));

/// Whether `model` is a plain Gemini model id such as `gemini-2.5-flash`.
pub fn is_valid_model_id(model: &str) -> bool {
    MODEL_ID.is_match(model)
}

/// A generative backend that streams chunks for one request.
pub trait GenerativeBackend: Send + Sync {
    fn stream_generate(
        &self,
        credential: &str,
        model: &str,
        request: GeminiRequest,
    ) -> impl Future<Output = Result<ChunkStream, LlmError>> + Send;
}

/// What the consumer of a [`StreamHandle`] receives. `End` and `Error` are
/// terminal: nothing follows either.
#[derive(Debug)]
pub enum StreamEvent {
    Fragment(String),
    End,
    Error(LlmError),
}

#[derive(Debug)]
pub struct StreamHandle {
    rx: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub(crate) fn channel(capacity: usize) -> (mpsc::Sender<StreamEvent>, StreamHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, StreamHandle { rx })
    }

    /// `None` once the producer is gone.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }
}

#[derive(Debug)]
pub struct StreamAdapter<B> {
    config: LlmConfig,
    backend: B,
}

impl<B: GenerativeBackend> StreamAdapter<B> {
    pub fn new(config: LlmConfig, backend: B) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    /// Opens one streaming request and hands back the fragment channel.
    ///
    /// Fails with [`LlmError::InvalidModel`] or [`LlmError::MissingCredential`]
    /// before touching the backend.
    pub async fn open(&self, prompt: &ComposedPrompt, model: &str) -> Result<StreamHandle, LlmError> {
        if !is_valid_model_id(model) {
            return Err(LlmError::InvalidModel(model.to_string()));
        }
        let credential = self.config.credential().ok_or(LlmError::MissingCredential)?;

        let request = GeminiRequest {
            contents: prompt.contents().to_vec(),
            generation_config: GeminiGenerationConfig::from_settings(
                self.config.temperature,
                self.config.max_output_tokens,
            ),
        };
        let chunks = self.backend.stream_generate(credential, model, request).await?;

        let (tx, handle) = StreamHandle::channel(self.config.channel_capacity);
        tokio::spawn(forward_chunks(chunks, tx, model.to_string()));
        Ok(handle)
    }
}

/// Drains backend chunks into the channel, one fragment per chunk with text.
async fn forward_chunks(mut chunks: ChunkStream, tx: mpsc::Sender<StreamEvent>, model: String) {
    let mut fragments = 0usize;
    while let Some(item) = chunks.next().await {
        let chunk = match item {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!("Upstream streaming error from {}: {}", model, e);
                let _ = tx.send(StreamEvent::Error(e)).await;
                return;
            }
        };

        if let Some(reason) = chunk.finish_reason() {
            if reason.is_truncation() {
                warn!("Generation for {} stopped early: {:?}", model, reason);
            }
        }
        if let Some(usage) = chunk.usage() {
            debug!(
                "usage for {}: prompt={:?} candidates={:?} thoughts={:?} total={:?}",
                model,
                usage.prompt_token_count,
                usage.candidates_token_count,
                usage.thoughts_token_count,
                usage.total_token_count
            );
        }

        match chunk.extract_text() {
            Some(text) if !text.is_empty() => {
                if tx.send(StreamEvent::Fragment(text.to_string())).await.is_err() {
                    debug!("Stream consumer dropped; abandoning {} stream", model);
                    return;
                }
                fragments += 1;
            }
            _ => match &chunk {
                ChunkShape::Unrecognized(value) => trace!("skipping unrecognized chunk: {}", value),
                _ => trace!("skipping chunk without text: {:?}", chunk),
            },
        }
    }
    debug!("{} stream finished after {} fragments", model, fragments);
    let _ = tx.send(StreamEvent::End).await;
}
