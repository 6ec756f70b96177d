use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::EmbedError;

/// Runtime configuration for the remote embedding service.
///
/// # Example
/// ```
/// use embed::EmbedConfig;
///
/// let cfg = EmbedConfig {
///     api_key: "sk-test".into(),
///     dimensions: Some(1536),
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbedConfig {
    /// Base URL of the OpenAI-compatible API, without the trailing `/embeddings`.
    pub api_base: String,
    /// Bearer token. Never read from YAML; injected from the environment.
    #[serde(skip)]
    pub api_key: String,
    /// Embedding model identifier.
    pub model: String,
    /// Output encoding requested from the service. Only `"float"` is parsed.
    pub encoding_format: String,
    /// Expected vector length. When set, responses of any other length are rejected.
    pub dimensions: Option<usize>,
    /// Overall request timeout in seconds.
    pub timeout_secs: u64,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".into(),
            api_key: String::new(),
            model: "text-embedding-3-small".into(),
            encoding_format: "float".into(),
            dimensions: None,
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl EmbedConfig {
    /// Reject configurations that can never produce a successful call.
    pub fn validate(&self) -> Result<(), EmbedError> {
        if self.api_key.trim().is_empty() {
            return Err(EmbedError::InvalidConfig("api_key is required".into()));
        }
        if self.api_base.trim().is_empty() {
            return Err(EmbedError::InvalidConfig("api_base is required".into()));
        }
        if self.model.trim().is_empty() {
            return Err(EmbedError::InvalidConfig("model is required".into()));
        }
        if self.encoding_format != "float" {
            return Err(EmbedError::InvalidConfig(format!(
                "unsupported encoding_format '{}', only 'float' is supported",
                self.encoding_format
            )));
        }
        if self.dimensions == Some(0) {
            return Err(EmbedError::InvalidConfig(
                "dimensions must be greater than zero".into(),
            ));
        }
        if self.timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(EmbedError::InvalidConfig(
                "timeouts must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Full URL of the embeddings endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/embeddings", self.api_base.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
