use embed::EmbedError;
use generate::GenerateError;
use thiserror::Error;
use vector::IndexError;

/// Failures of one RAG request.
///
/// Everything except [`RagError::StreamAborted`] happens before the first byte
/// of the answer exists, so the caller can still reply with an error status.
#[derive(Debug, Clone, Error)]
pub enum RagError {
    /// Missing or invalid credentials/settings. Raised before any network call.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid conversation: {0}")]
    InvalidConversation(String),

    #[error("embedding service error: {0}")]
    Embedding(#[from] EmbedError),

    #[error("index service error: {0}")]
    Index(#[from] IndexError),

    #[error("generation service error: {0}")]
    Generation(#[from] GenerateError),

    /// The answer was already streaming when the generator failed.
    #[error("response stream aborted: {0}")]
    StreamAborted(GenerateError),
}

impl RagError {
    /// True when the failure is an elapsed upstream wait rather than a refusal.
    pub fn is_upstream_timeout(&self) -> bool {
        match self {
            RagError::Embedding(err) => err.is_timeout(),
            RagError::Index(err) => err.is_timeout(),
            RagError::Generation(err) | RagError::StreamAborted(err) => err.is_timeout(),
            RagError::Configuration(_) | RagError::InvalidConversation(_) => false,
        }
    }

    /// Short stage label used in logs and metrics.
    pub fn stage(&self) -> &'static str {
        match self {
            RagError::Configuration(_) => "config",
            RagError::InvalidConversation(_) => "conversation",
            RagError::Embedding(_) => "embed",
            RagError::Index(_) => "index",
            RagError::Generation(_) | RagError::StreamAborted(_) => "generate",
        }
    }
}
