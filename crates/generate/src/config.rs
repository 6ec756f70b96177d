use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::GenerateError;

/// Settings for the streaming chat-completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerateConfig {
    /// Base URL, without the trailing `/chat/completions`.
    pub api_base: String,
    #[serde(skip)]
    pub api_key: String,
    pub model: String,
    /// Sampling temperature; the provider default is used when unset.
    pub temperature: Option<f32>,
    pub connect_timeout_secs: u64,
    /// Bound on the wait for response headers.
    pub request_timeout_secs: u64,
    /// Bound on the silence between two body reads once streaming.
    pub idle_timeout_secs: u64,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".into(),
            api_key: String::new(),
            model: "gpt-4o-mini".into(),
            temperature: None,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            idle_timeout_secs: 60,
        }
    }
}

impl GenerateConfig {
    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.api_key.trim().is_empty() {
            return Err(GenerateError::InvalidConfig("api_key is required".into()));
        }
        if self.model.trim().is_empty() {
            return Err(GenerateError::InvalidConfig("model is required".into()));
        }
        if self.request_timeout_secs == 0
            || self.idle_timeout_secs == 0
            || self.connect_timeout_secs == 0
        {
            return Err(GenerateError::InvalidConfig(
                "timeouts must be greater than zero".into(),
            ));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(GenerateError::InvalidConfig(format!(
                    "temperature {t} outside 0.0..=2.0"
                )));
            }
        }
        Ok(())
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}
