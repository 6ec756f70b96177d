//! Prometheus-backed pipeline metrics.

use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use profrag::{EmbedError, IndexError, PipelineMetrics, RagError, StreamOutcome};

pub const STAGE_DURATION: &str = "profrag_stage_duration_seconds";
pub const STAGE_FAILURES: &str = "profrag_stage_failures_total";
pub const STREAMS: &str = "profrag_streams_total";
pub const RETRIEVED_MATCHES: &str = "profrag_retrieved_matches";

/// Forwards pipeline observations to the global `metrics` recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusPipelineMetrics;

impl PrometheusPipelineMetrics {
    fn stage(stage: &'static str, latency: Duration, ok: bool) {
        metrics::histogram!(STAGE_DURATION, "stage" => stage).record(latency.as_secs_f64());
        if !ok {
            metrics::counter!(STAGE_FAILURES, "stage" => stage).increment(1);
        }
    }
}

impl PipelineMetrics for PrometheusPipelineMetrics {
    fn record_embed(&self, latency: Duration, result: Result<(), &EmbedError>) {
        Self::stage("embed", latency, result.is_ok());
    }

    fn record_index(&self, latency: Duration, result: Result<(), &IndexError>, matches: usize) {
        Self::stage("index", latency, result.is_ok());
        if result.is_ok() {
            metrics::histogram!(RETRIEVED_MATCHES).record(matches as f64);
        }
    }

    fn record_generate(&self, latency: Duration, result: Result<(), &RagError>) {
        Self::stage("generate", latency, result.is_ok());
    }

    fn record_stream(&self, latency: Duration, outcome: StreamOutcome, _fragments: usize) {
        metrics::histogram!(STAGE_DURATION, "stage" => "stream").record(latency.as_secs_f64());
        metrics::counter!(STREAMS, "outcome" => outcome.as_str()).increment(1);
    }
}

/// Install the Prometheus recorder for this process.
///
/// A recorder can be installed only once; later calls fail.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(handle)
}
