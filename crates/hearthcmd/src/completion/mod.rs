//! Hosted text-completion service.
//!
//! The resolver only needs `complete(prompt) -> text`; everything about the
//! remote endpoint (auth, envelope format, timeouts) stays behind the
//! `CompletionService` trait.

mod openai;

use async_trait::async_trait;

pub use openai::OpenAiCompletion;

/// A single completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,

    /// Upper bound on generated tokens
    pub max_tokens: u32,

    /// Sampling temperature, kept near zero for reproducible output
    pub temperature: f32,
}

/// Failures of the remote call itself, as opposed to its content.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response envelope: {0}")]
    Envelope(String),
}

impl CompletionError {
    /// HTTP status of the failed call, when the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            CompletionError::Status { status, .. } => Some(*status),
            CompletionError::Transport(_) | CompletionError::Envelope(_) => None,
        }
    }
}

/// Trait for text-completion backends
///
/// This allows swapping the hosted model, and faking it for tests.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Generate text for the given prompt
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

#[async_trait]
impl<T: CompletionService + ?Sized> CompletionService for std::sync::Arc<T> {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        (**self).complete(request).await
    }
}
