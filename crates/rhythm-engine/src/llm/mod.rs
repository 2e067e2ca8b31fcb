//! Language model client abstraction.
//!
//! Every call the editor makes is a single prompt in, a single text out. The
//! structured shapes (suggestion lists, ghostwriter rewrites) are requested by
//! attaching a JSON schema and parsed by the caller.

mod gemini;

pub use gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL, GeminiModel};

use async_trait::async_trait;
use serde_json::Value;

/// How the model should shape its answer
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    /// Free text
    Text,
    /// JSON matching the given schema
    Json(Value),
}

/// One prompt for the model.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub format: ResponseFormat,
}

impl GenerateRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            format: ResponseFormat::Text,
        }
    }

    pub fn json(prompt: impl Into<String>, schema: Value) -> Self {
        Self {
            prompt: prompt.into(),
            format: ResponseFormat::Json(schema),
        }
    }
}

/// Error type for model calls.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// No API credential configured.
    #[error("no API credential configured")]
    MissingCredential,

    /// Request never got an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// Credential rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Any other non-success status.
    #[error("api error {status}: {body}")]
    Api { status: u16, body: String },

    /// Success status but no text in the answer.
    #[error("model returned no text")]
    EmptyResponse,

    /// Answer could not be parsed into the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Result type for model calls.
pub type LlmResult<T> = Result<T, LlmError>;

/// A hosted text-generation endpoint.
///
/// Implementations make exactly one outbound request per call and never retry.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider/model label for logs.
    fn name(&self) -> &str;

    /// Send one prompt and return the generated text.
    async fn generate(&self, request: GenerateRequest) -> LlmResult<String>;
}
