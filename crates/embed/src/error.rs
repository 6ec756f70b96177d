use thiserror::Error;

/// Errors surfaced by the embedding client.
#[derive(Debug, Clone, Error)]
pub enum EmbedError {
    /// Configuration can never yield a successful call (missing key, bad URL, ...).
    #[error("invalid embedding config: {0}")]
    InvalidConfig(String),
    /// Nothing to embed.
    #[error("cannot embed empty input")]
    EmptyInput,
    /// Network-level failure before a response arrived.
    #[error("embedding request failed: {0}")]
    Request(String),
    /// The bounded wait for the service elapsed.
    #[error("embedding request timed out: {0}")]
    Timeout(String),
    /// The service refused our credentials.
    #[error("embedding service rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },
    /// Any other non-success status.
    #[error("embedding service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The response arrived but did not contain a usable vector.
    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),
}

impl EmbedError {
    /// True when the failure came from the wait bound rather than the service.
    pub fn is_timeout(&self) -> bool {
        matches!(self, EmbedError::Timeout(_))
    }
}

impl From<reqwest::Error> for EmbedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EmbedError::Timeout(err.to_string())
        } else if err.is_decode() {
            EmbedError::MalformedResponse(err.to_string())
        } else {
            EmbedError::Request(err.to_string())
        }
    }
}
