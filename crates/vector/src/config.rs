use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::IndexError;

/// Connection settings for the hosted vector index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    /// Data-plane host (e.g. `https://rmp-abc123.svc.pinecone.io`). When absent it is
    /// looked up once through the control plane using [`index_name`](Self::index_name).
    pub host: Option<String>,
    /// Index name used for the control-plane host lookup.
    pub index_name: String,
    /// Namespace every query is scoped to.
    pub namespace: String,
    /// Control-plane base URL.
    pub control_plane_url: String,
    /// `Api-Key` header value. Injected from the environment, never read from files.
    #[serde(skip)]
    pub api_key: String,
    /// Value of the `X-Pinecone-API-Version` header.
    pub api_version: String,
    /// Overall request timeout in seconds.
    pub timeout_secs: u64,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            host: None,
            index_name: "rmp".into(),
            namespace: "ns1".into(),
            control_plane_url: "https://api.pinecone.io".into(),
            api_key: String::new(),
            api_version: "2024-07".into(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.api_key.trim().is_empty() {
            return Err(IndexError::InvalidConfig("api_key is required".into()));
        }
        if self.namespace.trim().is_empty() {
            return Err(IndexError::InvalidConfig("namespace is required".into()));
        }
        if self.timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(IndexError::InvalidConfig(
                "timeouts must be greater than zero".into(),
            ));
        }
        match self.host.as_deref() {
            Some(host) if host.trim().is_empty() => {
                Err(IndexError::InvalidConfig("host must not be blank".into()))
            }
            Some(_) => Ok(()),
            None if self.index_name.trim().is_empty() => Err(IndexError::InvalidConfig(
                "either host or index_name is required".into(),
            )),
            None => Ok(()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Host strings from the control plane come without a scheme.
pub(crate) fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}
