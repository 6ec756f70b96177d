//! YAML pipeline configuration.
//!
//! Every section is optional and falls back to the stock defaults (index `rmp`, namespace `ns1`, `text-embedding-3-small`,
//! `gpt-4o-mini`, three neighbours). Secrets are never read from the file; they
//! come from the environment through [`RagConfig::with_env_credentials`].
//!
//! ```yaml
//! version: "1.0"
//!
//! embed:
//!   model: "text-embedding-3-small"
//!   timeout_secs: 30
//!
//! index:
//!   index_name: "rmp"
//!   namespace: "ns1"
//!   # host: "https://rmp-abc123.svc.pinecone.io"
//!
//! generate:
//!   model: "gpt-4o-mini"
//!   idle_timeout_secs: 60
//!
//! pipeline:
//!   top_k: 3
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use embed::EmbedConfig;
use generate::GenerateConfig;
use serde::{Deserialize, Serialize};
use vector::{DEFAULT_TOP_K, IndexConfig};

use crate::RagError;
use crate::prompt::SYSTEM_PROMPT;

/// Shared key for the embedding and generation provider.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Key for the vector index provider.
pub const PINECONE_API_KEY_VAR: &str = "PINECONE_API_KEY";

/// Settings owned by the pipeline itself rather than by one client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Neighbours retrieved per request.
    pub top_k: usize,
    /// Replaces [`SYSTEM_PROMPT`] when set.
    pub system_prompt: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            system_prompt: None,
        }
    }
}

impl PipelineConfig {
    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(SYSTEM_PROMPT)
    }

    pub fn validate(&self) -> Result<(), RagError> {
        if self.top_k == 0 {
            return Err(RagError::Configuration(
                "pipeline.top_k must be greater than zero".into(),
            ));
        }
        if matches!(self.system_prompt.as_deref(), Some(p) if p.trim().is_empty()) {
            return Err(RagError::Configuration(
                "pipeline.system_prompt must not be blank".into(),
            ));
        }
        Ok(())
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct RagConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub embed: EmbedConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub generate: GenerateConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            embed: EmbedConfig::default(),
            index: IndexConfig::default(),
            generate: GenerateConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl RagConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, RagError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RagError::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and check the non-secret parts of the configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RagError> {
        let config: RagConfig = serde_yaml::from_str(yaml)
            .map_err(|e| RagError::Configuration(format!("failed to parse YAML: {e}")))?;
        match config.version.as_str() {
            "1.0" | "1" => {}
            v => {
                return Err(RagError::Configuration(format!(
                    "unsupported config version: {v}"
                )));
            }
        }
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Fill the API keys from the process environment.
    ///
    /// Fails naming the first missing variable, before any client is built.
    pub fn with_env_credentials(self) -> Result<Self, RagError> {
        self.with_credentials_from(|name| std::env::var(name).ok())
    }

    /// Same as [`with_env_credentials`](Self::with_env_credentials) with an
    /// explicit lookup, so callers and tests need not touch the process env.
    pub fn with_credentials_from<F>(mut self, lookup: F) -> Result<Self, RagError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    RagError::Configuration(format!("environment variable {name} is not set"))
                })
        };
        let openai = read(OPENAI_API_KEY_VAR)?;
        let pinecone = read(PINECONE_API_KEY_VAR)?;
        self.embed.api_key = openai.clone();
        self.generate.api_key = openai;
        self.index.api_key = pinecone;
        Ok(self)
    }

    /// Full check, credentials included.
    pub fn validate(&self) -> Result<(), RagError> {
        self.embed
            .validate()
            .map_err(|e| RagError::Configuration(e.to_string()))?;
        self.index
            .validate()
            .map_err(|e| RagError::Configuration(e.to_string()))?;
        self.generate
            .validate()
            .map_err(|e| RagError::Configuration(e.to_string()))?;
        self.pipeline.validate()
    }

    /// Longest one request can wait on upstream services before its first
    /// fragment exists: embedding, index query, generation headers, then one
    /// idle window for the first streamed read.
    ///
    /// A front-end timeout at or below this cuts requests that every
    /// upstream is still allowed to finish.
    pub fn upstream_budget(&self) -> Duration {
        Duration::from_secs(
            self.embed.timeout_secs
                + self.index.timeout_secs
                + self.generate.request_timeout_secs
                + self.generate.idle_timeout_secs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn keys(name: &str) -> Option<String> {
        match name {
            OPENAI_API_KEY_VAR => Some("sk-test".into()),
            PINECONE_API_KEY_VAR => Some("pc-test".into()),
            _ => None,
        }
    }

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = RagConfig::from_yaml_str("{}").unwrap();
        assert_eq!(cfg, RagConfig::default());
        assert_eq!(cfg.index.namespace, "ns1");
        assert_eq!(cfg.embed.model, "text-embedding-3-small");
        assert_eq!(cfg.generate.model, "gpt-4o-mini");
        assert_eq!(cfg.pipeline.top_k, 3);
        assert_eq!(cfg.pipeline.system_prompt(), SYSTEM_PROMPT);
    }

    #[test]
    fn sections_override_defaults() {
        let cfg = RagConfig::from_yaml_str(
            r#"
version: "1.0"
index:
  namespace: "fall-2024"
  host: "rmp-abc.svc.pinecone.io"
generate:
  model: "gpt-4o"
  temperature: 0.2
pipeline:
  top_k: 5
  system_prompt: "Be brief."
"#,
        )
        .unwrap();
        assert_eq!(cfg.index.namespace, "fall-2024");
        assert_eq!(cfg.index.index_name, "rmp");
        assert_eq!(cfg.generate.model, "gpt-4o");
        assert_eq!(cfg.pipeline.top_k, 5);
        assert_eq!(cfg.pipeline.system_prompt(), "Be brief.");
    }

    #[test]
    fn api_keys_in_yaml_are_ignored() {
        let cfg = RagConfig::from_yaml_str("embed:\n  api_key: leaked\n").unwrap();
        assert!(cfg.embed.api_key.is_empty());
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let err = RagConfig::from_yaml_str("version: \"2.0\"\n").unwrap_err();
        assert!(err.to_string().contains("2.0"));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        assert!(matches!(
            RagConfig::from_yaml_str("pipeline:\n  top_k: 0\n"),
            Err(RagError::Configuration(_))
        ));
    }

    #[test]
    fn credentials_fill_every_client() {
        let cfg = RagConfig::default().with_credentials_from(keys).unwrap();
        assert_eq!(cfg.embed.api_key, "sk-test");
        assert_eq!(cfg.generate.api_key, "sk-test");
        assert_eq!(cfg.index.api_key, "pc-test");
        cfg.validate().unwrap();
    }

    #[test]
    fn missing_credential_names_the_variable() {
        let err = RagConfig::default()
            .with_credentials_from(|name| (name == OPENAI_API_KEY_VAR).then(|| "sk".to_string()))
            .unwrap_err();
        assert!(matches!(err, RagError::Configuration(_)));
        assert!(err.to_string().contains(PINECONE_API_KEY_VAR));

        let err = RagConfig::default()
            .with_credentials_from(|_| Some("   ".into()))
            .unwrap_err();
        assert!(err.to_string().contains(OPENAI_API_KEY_VAR));
    }

    #[test]
    fn validate_without_credentials_fails() {
        assert!(matches!(
            RagConfig::default().validate(),
            Err(RagError::Configuration(_))
        ));
    }

    #[test]
    fn upstream_budget_sums_stage_timeouts() {
        let cfg = RagConfig::default();
        assert_eq!(cfg.upstream_budget(), Duration::from_secs(30 + 30 + 30 + 60));

        let cfg = RagConfig::from_yaml_str("generate:\n  idle_timeout_secs: 10\n").unwrap();
        assert_eq!(cfg.upstream_budget(), Duration::from_secs(100));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "index:\n  namespace: \"ns2\"").unwrap();
        let cfg = RagConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(cfg.index.namespace, "ns2");
    }

    #[test]
    fn missing_file_is_configuration_error() {
        let err = RagConfig::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, RagError::Configuration(_)));
    }
}
