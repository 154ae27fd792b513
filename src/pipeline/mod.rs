pub mod aggregate;
pub mod prompt;
pub mod stream;

#[cfg(test)]
pub(crate) mod fake;

use std::time::Instant;
use tracing::{debug, info};

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::formatter;
use prompt::{Turn, compose};
use stream::{GenerativeBackend, StreamAdapter};

/// history → prompt → stream → full text → sanitized reply.
#[derive(Debug)]
pub struct ResponsePipeline<B> {
    adapter: StreamAdapter<B>,
}

impl<B: GenerativeBackend> ResponsePipeline<B> {
    pub fn new(config: LlmConfig, backend: B) -> Self {
        Self { adapter: StreamAdapter::new(config, backend) }
    }

    pub fn default_model(&self) -> &str {
        &self.adapter.config().default_model
    }

    /// Produces the complete, sanitized assistant reply for `history`.
    /// Opens exactly one backend stream and consumes it to the end.
    pub async fn get_response(&self, history: &[Turn], model: &str) -> Result<String, LlmError> {
        let started = Instant::now();
        let prompt = compose(history);
        debug!("Composed prompt with {} turns for model {}", prompt.contents().len(), model);

        let handle = self.adapter.open(&prompt, model).await?;
        let raw = aggregate::collect(handle).await?;
        let response = formatter::sanitize(&raw);

        info!(
            "Response from {} ready in {} ms ({} raw chars, {} sanitized)",
            model,
            started.elapsed().as_millis(),
            raw.chars().count(),
            response.chars().count()
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::gemini::ChunkShape;
    use fake::FakeBackend;

    fn pipeline(chunks: Vec<Result<ChunkShape, LlmError>>) -> ResponsePipeline<FakeBackend> {
        let config = LlmConfig { api_key: Some("k".to_string()), ..LlmConfig::default() };
        ResponsePipeline::new(config, FakeBackend::with_chunks(chunks))
    }

    #[tokio::test]
    async fn test_get_response_joins_chunks() {
        let p = pipeline(vec![
            Ok(ChunkShape::text("Hel")),
            Ok(ChunkShape::text("lo")),
            Ok(ChunkShape::text("")),
        ]);
        let reply = p.get_response(&[Turn::user("hi")], "gemini-test").await.unwrap();
        assert_eq!(reply, "Hello");
    }

    #[tokio::test]
    async fn test_get_response_sanitizes() {
        let p = pipeline(vec![
            Ok(ChunkShape::text("***Acknowledge***That is hard.")),
            Ok(ChunkShape::text("\n1. Rest<script>alert(1)</script>")),
        ]);
        let reply = p.get_response(&[Turn::user("hi")], "m").await.unwrap();
        assert_eq!(reply, "**Acknowledge** That is hard.\n\n1. Rest");
    }

    #[tokio::test]
    async fn test_get_response_mid_stream_error_returns_no_text() {
        let p = pipeline(vec![
            Ok(ChunkShape::text("partial")),
            Err(LlmError::Backend { status: None, message: "connection reset".to_string() }),
        ]);
        let err = p.get_response(&[Turn::user("hi")], "m").await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_get_response_missing_credential() {
        let p = ResponsePipeline::new(LlmConfig::default(), FakeBackend::with_chunks(vec![]));
        let err = p.get_response(&[Turn::user("hi")], "m").await.unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(p.adapter.backend().calls(), 0);
    }

    #[tokio::test]
    async fn test_default_model_from_config() {
        let config = LlmConfig { default_model: "gemini-custom".to_string(), ..LlmConfig::default() };
        let p = ResponsePipeline::new(config, FakeBackend::default());
        assert_eq!(p.default_model(), "gemini-custom");
    }
}
