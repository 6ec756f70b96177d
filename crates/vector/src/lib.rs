//! profrag similarity index client
//!
//! Given a query embedding, ask a hosted vector index (Pinecone data-plane
//! protocol) for the K nearest professor reviews and hand them back as
//! [`MatchRecord`]s, in exactly the order the index ranked them.
//!
//! A few rules this crate sticks to:
//!
//! - Every query targets the configured namespace. There is no fallback to
//!   another namespace when it comes back empty.
//! - Fewer than K matches is fine. Zero matches is fine too. Neither is an error.
//! - Records are never re-sorted locally. We may truncate to K, that's it.
//! - A match with missing or garbled metadata is kept; the bad field becomes
//!   `None`. See [`record`] for the exact policy.

pub mod config;
pub mod error;
pub mod record;

mod client;

pub use crate::client::VectorIndexClient;
pub use crate::config::IndexConfig;
pub use crate::error::IndexError;
pub use crate::record::MatchRecord;

use async_trait::async_trait;

/// Default neighbour count for review retrieval.
pub const DEFAULT_TOP_K: usize = 3;

/// Nearest-neighbour lookup over stored review vectors.
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// Return at most `top_k` records, highest similarity first, with metadata.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<MatchRecord>, IndexError>;
}
