use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::normalize_host;
use crate::{IndexConfig, IndexError, MatchRecord, SimilarityIndex};

/// Request body for the data-plane `/query` call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    id: String,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

/// Client for a Pinecone-compatible vector index.
#[derive(Debug, Clone)]
pub struct VectorIndexClient {
    http: reqwest::Client,
    cfg: IndexConfig,
    query_url: String,
}

impl VectorIndexClient {
    /// Build the client, resolving the data-plane host through the control plane
    /// when the config does not pin one.
    pub async fn connect(cfg: IndexConfig) -> Result<Self, IndexError> {
        cfg.validate()?;
        let http = build_http(&cfg)?;
        let host = match cfg.host.as_deref() {
            Some(host) => normalize_host(host),
            None => describe_host(&http, &cfg).await?,
        };
        tracing::info!(host = %host, namespace = %cfg.namespace, "vector index connected");
        Ok(Self {
            query_url: format!("{host}/query"),
            http,
            cfg,
        })
    }

    /// Build the client against a known host without any network call.
    pub fn with_host(cfg: IndexConfig, host: &str) -> Result<Self, IndexError> {
        cfg.validate()?;
        let http = build_http(&cfg)?;
        Ok(Self {
            query_url: format!("{}/query", normalize_host(host)),
            http,
            cfg,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.cfg.namespace
    }

    pub fn config(&self) -> &IndexConfig {
        &self.cfg
    }
}

fn build_http(cfg: &IndexConfig) -> Result<reqwest::Client, IndexError> {
    reqwest::Client::builder()
        .timeout(cfg.timeout())
        .connect_timeout(cfg.connect_timeout())
        .pool_max_idle_per_host(32)
        .build()
        .map_err(|e| IndexError::InvalidConfig(format!("failed to build HTTP client: {e}")))
}

async fn describe_host(http: &reqwest::Client, cfg: &IndexConfig) -> Result<String, IndexError> {
    let url = format!(
        "{}/indexes/{}",
        cfg.control_plane_url.trim_end_matches('/'),
        cfg.index_name
    );
    let response = http
        .get(&url)
        .header("Api-Key", &cfg.api_key)
        .header("X-Pinecone-API-Version", &cfg.api_version)
        .send()
        .await?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(IndexError::IndexNotFound(cfg.index_name.clone()));
    }
    let response = check_status(response).await?;
    let described: DescribeIndexResponse = response
        .json()
        .await
        .map_err(|e| IndexError::MalformedResponse(format!("describe index: {e}")))?;
    Ok(normalize_host(&described.host))
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, IndexError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(IndexError::Unauthorized {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IndexError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

#[async_trait]
impl SimilarityIndex for VectorIndexClient {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<MatchRecord>, IndexError> {
        let body = QueryRequest {
            namespace: &self.cfg.namespace,
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
        };

        let response = self
            .http
            .post(&self.query_url)
            .header("Api-Key", &self.cfg.api_key)
            .header("X-Pinecone-API-Version", &self.cfg.api_version)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| IndexError::MalformedResponse(format!("query: {e}")))?;

        let records: Vec<MatchRecord> = parsed
            .matches
            .into_iter()
            .take(top_k)
            .map(|m| MatchRecord::from_metadata(m.id, m.score, m.metadata.as_ref()))
            .collect();

        tracing::debug!(
            namespace = %self.cfg.namespace,
            requested = top_k,
            returned = records.len(),
            "index query complete"
        );
        Ok(records)
    }
}
