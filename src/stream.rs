//! Response streamer: relays generated fragments to the caller in arrival order.
//!
//! Lifecycle is `Idle -> Streaming -> Completed | Aborted`. [`ResponseStreamer::start`]
//! waits for the first fragment (or the terminal signal) so a generator that
//! fails immediately still surfaces as an ordinary pre-stream error. After that
//! the streamer is a plain [`Stream`] of byte chunks; an upstream failure is
//! yielded once as [`RagError::StreamAborted`] and the stream ends, which lets
//! an HTTP body abort the connection instead of closing it cleanly.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};
use std::time::Instant;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use generate::ChunkStream;

use crate::{PipelineMetrics, RagError, StreamOutcome, metrics_recorder};

/// Where a [`ResponseStreamer`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Streaming,
    Completed,
    Aborted,
}

impl StreamState {
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamState::Completed | StreamState::Aborted)
    }
}

pub struct ResponseStreamer {
    /// Upstream fragments; released as soon as a terminal state is reached.
    chunks: Option<ChunkStream>,
    state: StreamState,
    /// First fragment, pulled by `start` and handed out on the first poll.
    primed: Option<Bytes>,
    fragments: usize,
    bytes: usize,
    started: Instant,
    recorder: Option<Arc<dyn PipelineMetrics>>,
}

impl ResponseStreamer {
    /// Wrap `chunks` and wait until the first non-empty fragment or the end of
    /// the stream. Failing before that point is a [`RagError::Generation`].
    pub async fn start(chunks: ChunkStream) -> Result<Self, RagError> {
        let mut streamer = Self {
            chunks: Some(chunks),
            state: StreamState::Idle,
            primed: None,
            fragments: 0,
            bytes: 0,
            started: Instant::now(),
            recorder: metrics_recorder(),
        };
        streamer.prime().await?;
        Ok(streamer)
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Fragments handed to the caller so far.
    pub fn fragments_sent(&self) -> usize {
        self.fragments
    }

    async fn prime(&mut self) -> Result<(), RagError> {
        let Some(chunks) = self.chunks.as_mut() else {
            return Ok(());
        };
        loop {
            match chunks.next().await {
                Some(Ok(chunk)) if chunk.is_empty() => continue,
                Some(Ok(chunk)) => {
                    self.primed = Some(Bytes::from(chunk.text));
                    self.state = StreamState::Streaming;
                    return Ok(());
                }
                Some(Err(err)) => {
                    self.state = StreamState::Aborted;
                    self.chunks = None;
                    return Err(RagError::Generation(err));
                }
                None => {
                    // Terminal signal before any text; the caller gets an empty body.
                    self.state = StreamState::Streaming;
                    self.chunks = None;
                    return Ok(());
                }
            }
        }
    }

    fn finish(&mut self, state: StreamState) {
        self.state = state;
        self.chunks = None;
        let outcome = match state {
            StreamState::Completed => StreamOutcome::Completed,
            _ => StreamOutcome::Aborted,
        };
        tracing::debug!(
            outcome = ?outcome,
            fragments = self.fragments,
            bytes = self.bytes,
            "response stream finished"
        );
        self.record(outcome);
    }

    fn record(&self, outcome: StreamOutcome) {
        if let Some(recorder) = &self.recorder {
            recorder.record_stream(self.started.elapsed(), outcome, self.fragments);
        }
    }

    fn emit(&mut self, text: Bytes) -> Poll<Option<Result<Bytes, RagError>>> {
        self.fragments += 1;
        self.bytes += text.len();
        Poll::Ready(Some(Ok(text)))
    }
}

impl Stream for ResponseStreamer {
    type Item = Result<Bytes, RagError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if let Some(first) = this.primed.take() {
            return this.emit(first);
        }
        if this.state != StreamState::Streaming {
            return Poll::Ready(None);
        }
        loop {
            let Some(chunks) = this.chunks.as_mut() else {
                // Upstream already ended during `start`.
                this.finish(StreamState::Completed);
                return Poll::Ready(None);
            };
            match ready!(chunks.poll_next_unpin(cx)) {
                Some(Ok(chunk)) if chunk.is_empty() => continue,
                Some(Ok(chunk)) => return this.emit(Bytes::from(chunk.text)),
                Some(Err(err)) => {
                    tracing::warn!(
                        error = %err,
                        fragments = this.fragments,
                        "generation failed mid-stream; aborting response"
                    );
                    this.finish(StreamState::Aborted);
                    return Poll::Ready(Some(Err(RagError::StreamAborted(err))));
                }
                None => {
                    this.finish(StreamState::Completed);
                    return Poll::Ready(None);
                }
            }
        }
    }
}

impl Drop for ResponseStreamer {
    fn drop(&mut self) {
        if self.state == StreamState::Streaming {
            tracing::debug!(
                fragments = self.fragments,
                "caller went away mid-stream; releasing upstream generation"
            );
            self.record(StreamOutcome::Cancelled);
        }
    }
}

impl std::fmt::Debug for ResponseStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseStreamer")
            .field("state", &self.state)
            .field("fragments", &self.fragments)
            .field("bytes", &self.bytes)
            .finish_non_exhaustive()
    }
}
