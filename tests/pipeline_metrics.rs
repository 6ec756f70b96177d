//! The installed `PipelineMetrics` observer sees every stage and the stream outcome.
//!
//! Kept in its own test binary: the recorder is process-wide.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, stream};
use profrag::{
    ChatMessage, ChunkStream, Conversation, EmbedError, Embedder, Embedding, GenerateError,
    GenerationChunk, Generator, IndexError, MatchRecord, PipelineConfig, PipelineMetrics,
    RagError, RagPipeline, SimilarityIndex, StreamOutcome, set_pipeline_metrics,
};

#[derive(Default)]
struct Events(Mutex<Vec<String>>);

impl PipelineMetrics for Events {
    fn record_embed(&self, _latency: Duration, result: Result<(), &EmbedError>) {
        self.0.lock().unwrap().push(format!("embed ok={}", result.is_ok()));
    }

    fn record_index(&self, _latency: Duration, result: Result<(), &IndexError>, matches: usize) {
        self.0
            .lock()
            .unwrap()
            .push(format!("index ok={} matches={matches}", result.is_ok()));
    }

    fn record_generate(&self, _latency: Duration, result: Result<(), &RagError>) {
        self.0
            .lock()
            .unwrap()
            .push(format!("generate ok={}", result.is_ok()));
    }

    fn record_stream(&self, _latency: Duration, outcome: StreamOutcome, fragments: usize) {
        self.0
            .lock()
            .unwrap()
            .push(format!("stream {} fragments={fragments}", outcome.as_str()));
    }
}

struct OneVector;

#[async_trait]
impl Embedder for OneVector {
    async fn embed(&self, _text: &str) -> Result<Embedding, EmbedError> {
        Ok(Embedding::new(vec![1.0, 0.0], "m"))
    }
}

struct TwoMatches;

#[async_trait]
impl SimilarityIndex for TwoMatches {
    async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<MatchRecord>, IndexError> {
        Ok(["Dr. A", "Dr. B"]
            .into_iter()
            .map(|id| MatchRecord::from_metadata(id.to_string(), Some(0.5), None))
            .collect())
    }
}

struct Fragments(Vec<Result<&'static str, GenerateError>>);

#[async_trait]
impl Generator for Fragments {
    async fn stream(&self, _messages: &[ChatMessage]) -> Result<ChunkStream, GenerateError> {
        let items: Vec<_> = self
            .0
            .iter()
            .cloned()
            .map(|item| item.map(GenerationChunk::text))
            .collect();
        Ok(stream::iter(items).boxed())
    }
}

#[tokio::test]
async fn stages_and_outcomes_are_reported() {
    let events = Arc::new(Events::default());
    set_pipeline_metrics(Some(events.clone()));

    let conversation = Conversation::new(vec![ChatMessage::user("q")]).unwrap();

    let completed = RagPipeline::new(
        Arc::new(OneVector),
        Arc::new(TwoMatches),
        Arc::new(Fragments(vec![Ok("a"), Ok("b")])),
        PipelineConfig::default(),
    );
    let streamer = completed.answer(&conversation).await.unwrap();
    let _: Vec<_> = streamer.collect().await;

    let aborted = RagPipeline::new(
        Arc::new(OneVector),
        Arc::new(TwoMatches),
        Arc::new(Fragments(vec![
            Ok("a"),
            Err(GenerateError::Stream("reset".into())),
        ])),
        PipelineConfig::default(),
    );
    let streamer = aborted.answer(&conversation).await.unwrap();
    let _: Vec<_> = streamer.collect().await;

    let mut cancelled = completed.answer(&conversation).await.unwrap();
    let _ = cancelled.next().await;
    drop(cancelled);

    set_pipeline_metrics(None);

    let events = events.0.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "embed ok=true",
            "index ok=true matches=2",
            "generate ok=true",
            "stream completed fragments=2",
            "embed ok=true",
            "index ok=true matches=2",
            "generate ok=true",
            "stream aborted fragments=1",
            "embed ok=true",
            "index ok=true matches=2",
            "generate ok=true",
            "stream cancelled fragments=1",
        ]
    );
}
