//! profrag answer generation
//!
//! Sends the assembled prompt to an OpenAI-compatible `/chat/completions`
//! endpoint with `stream: true` and exposes the reply as a lazy, forward-only
//! stream of [`GenerationChunk`]s, one per server-sent event.
//!
//! The contract the rest of the pipeline relies on:
//!
//! - [`Generator::stream`] resolves only once the upstream has accepted the
//!   request (2xx headers). Auth and network problems fail here, before any
//!   text exists.
//! - The returned stream is finite. It ends after `data: [DONE]`.
//! - A failure after that point is yielded as one `Err` item and the stream
//!   ends. A body that stops without `[DONE]` is reported as
//!   [`GenerateError::Truncated`] instead of looking like a clean finish.
//! - Every network wait is bounded: connect, response headers, and the gap
//!   between two body reads.

pub mod config;
pub mod error;
pub mod message;
pub mod sse;

mod client;

pub use crate::client::ChatCompletionsClient;
pub use crate::config::GenerateConfig;
pub use crate::error::GenerateError;
pub use crate::message::{ChatMessage, GenerationChunk, Role};

use async_trait::async_trait;
use futures::stream::BoxStream;

/// Lazy, non-restartable sequence of generated fragments.
pub type ChunkStream = BoxStream<'static, Result<GenerationChunk, GenerateError>>;

/// A generative model that can stream a completion for a message list.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn stream(&self, messages: &[ChatMessage]) -> Result<ChunkStream, GenerateError>;
}
