//! profrag query embedding
//!
//! This crate turns the active user turn into a dense vector so the similarity
//! index can find reviews that talk about the same thing. It speaks the
//! OpenAI-style `/embeddings` protocol, which most hosted embedding services
//! copy these days.
//!
//! There is exactly one call per request and no local retry. If the upstream
//! service is down, unauthorized, or sends back something we can't read, the
//! error bubbles up and the request fails before anything else happens. A
//! half-parsed vector is worse than no vector.
//!
//! ## Quick example
//!
//! ```no_run
//! use embed::{EmbedConfig, Embedder, EmbeddingClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), embed::EmbedError> {
//!     let cfg = EmbedConfig {
//!         api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
//!         ..Default::default()
//!     };
//!     let client = EmbeddingClient::new(cfg)?;
//!     let embedding = client.embed("Who teaches great intro physics courses?").await?;
//!     println!("{} dims", embedding.dim());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod types;

mod client;

pub use crate::client::EmbeddingClient;
pub use crate::config::EmbedConfig;
pub use crate::error::EmbedError;
pub use crate::types::Embedding;

use async_trait::async_trait;

/// Anything that can turn a piece of text into one [`Embedding`].
///
/// The pipeline holds this behind an `Arc<dyn Embedder>` so the HTTP client is
/// built once per process and shared by every request.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `text` into a single vector of the model's fixed dimensionality.
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedError>;
}
