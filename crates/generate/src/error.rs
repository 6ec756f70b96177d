use thiserror::Error;

/// Errors from the generation client, both before and during streaming.
#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    #[error("invalid generation config: {0}")]
    InvalidConfig(String),
    /// Could not reach the service or send the request.
    #[error("generation request failed: {0}")]
    Request(String),
    /// A bounded wait elapsed (headers or between two chunks).
    #[error("generation timed out: {0}")]
    Timeout(String),
    #[error("generation service rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },
    #[error("generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// Transport failure while reading the body.
    #[error("generation stream failed: {0}")]
    Stream(String),
    /// The service sent an error event inside the stream.
    #[error("generation service reported an error: {0}")]
    Upstream(String),
    /// An event payload could not be decoded.
    #[error("undecodable generation chunk: {0}")]
    Decode(String),
    /// The body ended without the completion marker.
    #[error("generation stream ended before completion")]
    Truncated,
}

impl GenerateError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GenerateError::Timeout(_))
    }
}
