//! In-memory backend for pipeline tests.

use futures::StreamExt;
use futures::stream;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::converters::gemini::{ChunkShape, GeminiRequest};
use crate::error::LlmError;
use crate::pipeline::stream::{ChunkStream, GenerativeBackend};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub credential: String,
    pub model: String,
    pub request: GeminiRequest,
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    chunks: Mutex<Vec<Result<ChunkShape, LlmError>>>,
    open_error: Option<(u16, String)>,
    calls: AtomicUsize,
    last: Mutex<Option<RecordedCall>>,
}

impl FakeBackend {
    pub fn with_chunks(chunks: Vec<Result<ChunkShape, LlmError>>) -> Self {
        Self { chunks: Mutex::new(chunks), ..Self::default() }
    }

    pub fn failing_open(status: u16, message: &str) -> Self {
        Self { open_error: Some((status, message.to_string())), ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedCall> {
        self.last.lock().unwrap().clone()
    }
}

impl GenerativeBackend for FakeBackend {
    async fn stream_generate(
        &self,
        credential: &str,
        model: &str,
        request: GeminiRequest,
    ) -> Result<ChunkStream, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(RecordedCall {
            credential: credential.to_string(),
            model: model.to_string(),
            request,
        });
        if let Some((status, message)) = &self.open_error {
            return Err(LlmError::Backend { status: Some(*status), message: message.clone() });
        }
        let chunks = std::mem::take(&mut *self.chunks.lock().unwrap());
        Ok(stream::iter(chunks).boxed())
    }
}
