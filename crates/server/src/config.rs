use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File stem looked up by [`ServerConfig::load`]; any extension `config` understands.
pub const CONFIG_FILE_STEM: &str = "server";

/// Prefix for environment overrides, e.g. `PROFRAG_SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "PROFRAG_SERVER";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 180;
const DEFAULT_MAX_BODY_MB: usize = 1;

/// HTTP front-end settings. Every field is optional in the sources.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,

    /// Seconds a request may take until its response headers are ready.
    /// Must exceed the pipeline's upstream budget so slow upstreams surface
    /// as their own errors. Streaming bodies are bounded by the generator's
    /// idle timeout instead.
    pub timeout_secs: u64,

    /// Upper bound for the conversation body, in MiB.
    pub max_body_size_mb: usize,

    pub enable_cors: bool,

    /// Log filter directive (`info`, `server=debug,profrag=debug`, ...)
    pub log_level: String,

    /// JSON lines instead of human-readable text
    pub log_json: bool,

    /// Install the Prometheus recorder and serve `/metrics`
    pub metrics_enabled: bool,

    /// YAML pipeline configuration; pipeline defaults apply when unset
    pub pipeline_config: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_body_size_mb: DEFAULT_MAX_BODY_MB,
            enable_cors: true,
            log_level: "info".into(),
            log_json: true,
            metrics_enabled: true,
            pipeline_config: None,
        }
    }
}

impl ServerConfig {
    /// Layer `server.{toml,yaml,json}` (when present) under `PROFRAG_SERVER__*`
    /// environment variables.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(CONFIG_FILE_STEM)
    }

    /// [`load`](Self::load) with an explicit file stem.
    pub fn load_from(file_stem: impl AsRef<Path>) -> anyhow::Result<Self> {
        let stem = file_stem.as_ref().to_string_lossy();
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&stem).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.bind_addr, self.port).parse()?)
    }

    /// Header timeout applied by the router.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Body limit in bytes.
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb.saturating_mul(1024 * 1024)
    }
}
