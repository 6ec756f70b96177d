use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use profrag::RagError;
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Everything a handler can fail with before the first body byte is sent.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conversation body exceeds {0} MiB")]
    PayloadTooLarge(usize),

    #[error(transparent)]
    Rag(#[from] RagError),

    #[error("server misconfigured: {0}")]
    Config(String),

    #[error("no such route")]
    NotFound,
}

/// `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        let rag = match self {
            Self::BadRequest(_) => return StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => return StatusCode::PAYLOAD_TOO_LARGE,
            Self::Config(_) => return StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => return StatusCode::NOT_FOUND,
            Self::Rag(err) => err,
        };
        match rag {
            RagError::InvalidConversation(_) => StatusCode::BAD_REQUEST,
            RagError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            err if err.is_upstream_timeout() => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    /// Stable machine-readable code; clients branch on this, not the message.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::Config(_) | Self::Rag(RagError::Configuration(_)) => "CONFIG_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Rag(RagError::InvalidConversation(_)) => "INVALID_CONVERSATION",
            Self::Rag(RagError::Embedding(_)) => "EMBEDDING_SERVICE_ERROR",
            Self::Rag(RagError::Index(_)) => "INDEX_SERVICE_ERROR",
            Self::Rag(RagError::Generation(_)) => "GENERATION_SERVICE_ERROR",
            Self::Rag(RagError::StreamAborted(_)) => "STREAM_ABORTED",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        if status.is_server_error() {
            tracing::error!(code, error = %self, "chat request failed before streaming");
        } else {
            tracing::debug!(code, error = %self, "request rejected");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("invalid conversation body: {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use profrag::{EmbedError, GenerateError, IndexError};

    #[test]
    fn pre_stream_failures_map_to_statuses() {
        let cases = [
            (RagError::InvalidConversation("empty".into()), StatusCode::BAD_REQUEST),
            (
                RagError::Configuration("OPENAI_API_KEY".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RagError::Embedding(EmbedError::Request("refused".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                RagError::Index(IndexError::Unauthorized { status: 401 }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                RagError::Generation(GenerateError::Timeout("30s".into())),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                RagError::Embedding(EmbedError::Timeout("30s".into())),
                StatusCode::GATEWAY_TIMEOUT,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).status_code(), status);
        }
    }

    #[test]
    fn error_codes_name_the_failing_service() {
        let err = ServerError::from(RagError::Index(IndexError::Request("dns".into())));
        assert_eq!(err.error_code(), "INDEX_SERVICE_ERROR");
        assert_eq!(ServerError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ServerError::PayloadTooLarge(1).error_code(), "PAYLOAD_TOO_LARGE");
        assert_eq!(
            ServerError::Config("bad".into()).error_code(),
            ServerError::from(RagError::Configuration("x".into())).error_code()
        );
    }
}
