use crate::error::{ServerError, ServerResult};
use crate::middleware::RequestId;
use crate::state::ServerState;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use profrag::{Conversation, ConversationTurn};
use std::sync::Arc;
use tracing::Instrument;

/// `POST /api/chat`
///
/// Body: the conversation as a JSON array of `{role, content}` turns. The reply
/// is `text/plain`, streamed chunk by chunk as the model generates it.
///
/// Failures before the first fragment produce an error status with a JSON
/// body. A failure after that aborts the connection, so clients see a
/// truncated transfer rather than a clean end.
pub async fn chat(
    State(state): State<Arc<ServerState>>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<Vec<ConversationTurn>>, JsonRejection>,
) -> ServerResult<Response> {
    let Json(turns) = payload.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge(state.config.max_body_size_mb)
        } else {
            ServerError::from(rejection)
        }
    })?;
    let conversation = Conversation::new(turns)?;

    let span = tracing::info_span!("chat", request_id = %request_id, turns = conversation.len());
    let streamer = state.pipeline.answer(&conversation).instrument(span).await?;

    Ok((
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(streamer),
    )
        .into_response())
}
