//! Retrieval-augmented professor recommendations.
//!
//! This crate wires the stage crates into one request pipeline:
//!
//! ```text
//! Conversation -> embed -> vector (top K) -> context -> prompt -> generate -> ResponseStreamer
//! ```
//!
//! Stages run strictly in that order for each request. Nothing here is shared
//! between requests except the client handles, which are built once per process
//! and held behind `Arc<dyn ...>`.

pub mod config;
pub mod context;
pub mod conversation;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod stream;

pub use crate::config::{PipelineConfig, RagConfig};
pub use crate::context::{RESULTS_HEADER, augment_turn, compose_context};
pub use crate::conversation::{Conversation, ConversationTurn};
pub use crate::error::RagError;
pub use crate::pipeline::RagPipeline;
pub use crate::prompt::{PromptMessages, SYSTEM_PROMPT, assemble_prompt};
pub use crate::stream::{ResponseStreamer, StreamState};

pub use embed::{EmbedConfig, EmbedError, Embedder, Embedding, EmbeddingClient};
pub use generate::{
    ChatCompletionsClient, ChatMessage, ChunkStream, GenerateConfig, GenerateError,
    GenerationChunk, Generator, Role,
};
pub use vector::{IndexConfig, IndexError, MatchRecord, SimilarityIndex, VectorIndexClient};

use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

/// How a response stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamOutcome {
    Completed,
    Aborted,
    /// The caller dropped the stream before it finished.
    Cancelled,
}

impl StreamOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamOutcome::Completed => "completed",
            StreamOutcome::Aborted => "aborted",
            StreamOutcome::Cancelled => "cancelled",
        }
    }
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_embed(&self, latency: Duration, result: Result<(), &EmbedError>);
    fn record_index(&self, latency: Duration, result: Result<(), &IndexError>, matches: usize);
    /// Time from opening the generation request to its first fragment.
    fn record_generate(&self, latency: Duration, result: Result<(), &RagError>);
    fn record_stream(&self, latency: Duration, outcome: StreamOutcome, fragments: usize);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Times one stage and reports it to the installed recorder, if any.
pub(crate) struct MetricsSpan {
    recorder: Option<Arc<dyn PipelineMetrics>>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Self {
        Self {
            recorder: metrics_recorder(),
            start: Instant::now(),
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub(crate) fn record_embed(self, result: Result<(), &EmbedError>) {
        if let Some(recorder) = &self.recorder {
            recorder.record_embed(self.start.elapsed(), result);
        }
    }

    pub(crate) fn record_index(self, result: Result<(), &IndexError>, matches: usize) {
        if let Some(recorder) = &self.recorder {
            recorder.record_index(self.start.elapsed(), result, matches);
        }
    }

    pub(crate) fn record_generate(self, result: Result<(), &RagError>) {
        if let Some(recorder) = &self.recorder {
            recorder.record_generate(self.start.elapsed(), result);
        }
    }
}
