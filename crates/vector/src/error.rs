use thiserror::Error;

/// Errors surfaced by the similarity index client.
#[derive(Debug, Clone, Error)]
pub enum IndexError {
    #[error("invalid index config: {0}")]
    InvalidConfig(String),
    #[error("index request failed: {0}")]
    Request(String),
    #[error("index request timed out: {0}")]
    Timeout(String),
    #[error("index service rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },
    #[error("index '{0}' not found")]
    IndexNotFound(String),
    #[error("index service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed index response: {0}")]
    MalformedResponse(String),
}

impl IndexError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, IndexError::Timeout(_))
    }
}

impl From<reqwest::Error> for IndexError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            IndexError::Timeout(err.to_string())
        } else if err.is_decode() {
            IndexError::MalformedResponse(err.to_string())
        } else {
            IndexError::Request(err.to_string())
        }
    }
}
