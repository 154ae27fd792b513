pub mod gemini_candidate;
pub mod gemini_content;
pub mod gemini_error;
pub mod gemini_finish_reason;
pub mod gemini_generation_config;
pub mod gemini_part;
pub mod gemini_request;
pub mod gemini_stream_chunk;
pub mod gemini_usage;

pub use gemini_candidate::GeminiCandidate;
pub use gemini_content::GeminiContent;
pub use gemini_error::GeminiErrorEnvelope;
pub use gemini_finish_reason::GeminiFinishReason;
pub use gemini_generation_config::GeminiGenerationConfig;
pub use gemini_part::GeminiPart;
pub use gemini_request::GeminiRequest;
pub use gemini_stream_chunk::{ChunkShape, GeminiStreamFrame};
pub use gemini_usage::GeminiUsage;
