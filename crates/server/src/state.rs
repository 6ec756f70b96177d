use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use metrics_exporter_prometheus::PrometheusHandle;
use profrag::{RagConfig, RagPipeline};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Pipeline with its service clients, shared across requests
    pub pipeline: Arc<RagPipeline>,

    /// Renders `/metrics`; `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Build state from the pipeline YAML (if configured) and environment credentials.
    pub async fn connect(config: ServerConfig) -> ServerResult<Self> {
        let rag_config = match &config.pipeline_config {
            Some(path) => RagConfig::from_yaml_file(path)?,
            None => RagConfig::default(),
        };
        ensure_timeout_covers_upstreams(&config, &rag_config)?;
        let rag_config = rag_config.with_env_credentials()?;
        let pipeline = RagPipeline::from_config(&rag_config)
            .await
            .map_err(|e| ServerError::Config(format!("pipeline setup failed: {e}")))?;
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Wrap an already-built pipeline.
    pub fn with_pipeline(config: ServerConfig, pipeline: RagPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// The router's header timeout has to outlast every upstream timeout, or a
/// slow embedding turns into a 408 instead of a 504 and a slow first token is
/// cut off while the generator would still wait for it.
pub(crate) fn ensure_timeout_covers_upstreams(
    config: &ServerConfig,
    rag_config: &RagConfig,
) -> ServerResult<()> {
    let budget = rag_config.upstream_budget();
    if config.timeout() <= budget {
        return Err(ServerError::Config(format!(
            "timeout_secs ({}) must exceed the upstream budget of {}s \
             (embed + index + generation headers + first idle window)",
            config.timeout_secs,
            budget.as_secs()
        )));
    }
    Ok(())
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_outlasts_default_upstreams() {
        ensure_timeout_covers_upstreams(&ServerConfig::default(), &RagConfig::default()).unwrap();
    }

    #[test]
    fn timeout_within_upstream_budget_is_rejected() {
        let config = ServerConfig {
            timeout_secs: 30,
            ..Default::default()
        };
        let err = ensure_timeout_covers_upstreams(&config, &RagConfig::default()).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("150s"));

        let config = ServerConfig {
            timeout_secs: 150,
            ..Default::default()
        };
        assert!(ensure_timeout_covers_upstreams(&config, &RagConfig::default()).is_err());
    }

    #[test]
    fn shorter_upstreams_allow_shorter_timeout() {
        let rag = RagConfig::from_yaml_str(
            "embed:\n  timeout_secs: 5\nindex:\n  timeout_secs: 5\ngenerate:\n  request_timeout_secs: 5\n  idle_timeout_secs: 10\n",
        )
        .unwrap();
        let config = ServerConfig {
            timeout_secs: 30,
            ..Default::default()
        };
        ensure_timeout_covers_upstreams(&config, &rag).unwrap();
    }
}
