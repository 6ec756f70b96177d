use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::{EmbedConfig, EmbedError, Embedder, Embedding};

/// HTTP client for an OpenAI-compatible `/embeddings` endpoint.
///
/// Build it once at startup and share it; the inner `reqwest::Client` pools
/// connections and is cheap to clone.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    http: reqwest::Client,
    cfg: EmbedConfig,
    endpoint: String,
}

impl EmbeddingClient {
    pub fn new(cfg: EmbedConfig) -> Result<Self, EmbedError> {
        cfg.validate()?;
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .connect_timeout(cfg.connect_timeout())
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| EmbedError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        let endpoint = cfg.endpoint();
        Ok(Self {
            http,
            cfg,
            endpoint,
        })
    }

    pub fn config(&self) -> &EmbedConfig {
        &self.cfg
    }

    async fn send(&self, payload: Value) -> Result<Value, EmbedError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.cfg.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(EmbedError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| EmbedError::MalformedResponse(format!("invalid JSON response: {e}")))
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<(), EmbedError> {
        if vector.is_empty() {
            return Err(EmbedError::MalformedResponse(
                "embedding vector is empty".into(),
            ));
        }
        match self.cfg.dimensions {
            Some(expected) if expected != vector.len() => Err(EmbedError::MalformedResponse(
                format!(
                    "expected {expected}-dimensional embedding, got {}",
                    vector.len()
                ),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedError> {
        if text.trim().is_empty() {
            return Err(EmbedError::EmptyInput);
        }

        let payload = json!({
            "model": self.cfg.model,
            "input": text,
            "encoding_format": self.cfg.encoding_format,
        });

        tracing::debug!(model = %self.cfg.model, chars = text.len(), "requesting embedding");
        let response = self.send(payload).await?;

        let vector = parse_embeddings_from_value(response)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                EmbedError::MalformedResponse("response did not contain an embedding".into())
            })?;
        self.check_dimensions(&vector)?;

        Ok(Embedding::new(vector, self.cfg.model.clone()))
    }
}

fn parse_embeddings_from_value(value: Value) -> Result<Vec<Vec<f32>>, EmbedError> {
    let Value::Object(mut map) = value else {
        return Err(EmbedError::MalformedResponse(
            "response body must be a JSON object".into(),
        ));
    };

    if let Some(embeddings) = map.remove("embeddings") {
        return match embeddings {
            Value::Array(items) => items.into_iter().map(parse_embedding_vector).collect(),
            other => Err(EmbedError::MalformedResponse(format!(
                "`embeddings` must be an array, got {other}"
            ))),
        };
    }

    match map.remove("data") {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(mut obj) => obj
                    .remove("embedding")
                    .ok_or_else(|| {
                        EmbedError::MalformedResponse(
                            "missing `embedding` field in data item".into(),
                        )
                    })
                    .and_then(parse_embedding_vector),
                _ => Err(EmbedError::MalformedResponse(
                    "unexpected entry inside `data` array".into(),
                )),
            })
            .collect(),
        Some(_) => Err(EmbedError::MalformedResponse(
            "`data` must be an array".into(),
        )),
        None => Err(EmbedError::MalformedResponse(
            "unsupported API response shape".into(),
        )),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, EmbedError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num.as_f64().map(|f| f as f32).ok_or_else(|| {
                    EmbedError::MalformedResponse("non-finite embedding value".into())
                }),
                other => Err(EmbedError::MalformedResponse(format!(
                    "embedding entries must be numbers, got {other}"
                ))),
            })
            .collect(),
        other => Err(EmbedError::MalformedResponse(format!(
            "embedding vector must be an array, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> EmbeddingClient {
        EmbeddingClient::new(EmbedConfig {
            api_base: server.url("/v1"),
            api_key: "test-key".into(),
            timeout_secs: 5,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn parse_openai_shape() {
        let vectors =
            parse_embeddings_from_value(json!({"data": [{"index": 0, "embedding": [0.5, -1.0]}]}))
                .unwrap();
        assert_eq!(vectors, vec![vec![0.5, -1.0]]);
    }

    #[test]
    fn parse_embeddings_shape() {
        let vectors = parse_embeddings_from_value(json!({"embeddings": [[1.0, 2.0]]})).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 2.0]]);
    }

    #[test]
    fn parse_rejects_missing_vector_payload() {
        let err = parse_embeddings_from_value(json!({"data": [{"index": 0}]})).unwrap_err();
        assert!(matches!(err, EmbedError::MalformedResponse(_)));

        let err = parse_embeddings_from_value(json!({"object": "list"})).unwrap_err();
        assert!(err.to_string().contains("unsupported API response shape"));
    }

    #[test]
    fn parse_rejects_non_numeric_entries() {
        let err = parse_embeddings_from_value(json!({"data": [{"embedding": [0.1, "x"]}]}))
            .unwrap_err();
        assert!(err.to_string().contains("must be numbers"));
    }

    #[tokio::test]
    async fn embeds_active_turn_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/embeddings")
                    .header("authorization", "Bearer test-key")
                    .json_body(json!({
                        "model": "text-embedding-3-small",
                        "input": "Who teaches great intro physics courses?",
                        "encoding_format": "float",
                    }));
                then.status(200)
                    .json_body(json!({"data": [{"index": 0, "embedding": [0.1, 0.2, 0.3]}]}));
            })
            .await;

        let client = client_for(&server);
        let embedding = client
            .embed("Who teaches great intro physics courses?")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(embedding.vector, vec![0.1, 0.2, 0.3]);
        assert_eq!(embedding.model, "text-embedding-3-small");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_typed_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(401).body("invalid api key");
            })
            .await;

        let err = client_for(&server).embed("hello").await.unwrap_err();
        assert!(matches!(err, EmbedError::Unauthorized { status: 401 }));
    }

    #[tokio::test]
    async fn server_error_keeps_status_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(503).body("overloaded");
            })
            .await;

        match client_for(&server).embed("hello").await.unwrap_err() {
            EmbedError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error variant {other:?}"),
        }
    }

    #[tokio::test]
    async fn dimension_mismatch_is_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200)
                    .json_body(json!({"data": [{"embedding": [0.1, 0.2]}]}));
            })
            .await;

        let client = EmbeddingClient::new(EmbedConfig {
            api_base: server.url("/v1"),
            api_key: "test-key".into(),
            dimensions: Some(3),
            ..Default::default()
        })
        .unwrap();

        let err = client.embed("hello").await.unwrap_err();
        assert!(err.to_string().contains("expected 3-dimensional"));
    }

    #[tokio::test]
    async fn blank_input_never_reaches_the_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200);
            })
            .await;

        let err = client_for(&server).embed("   ").await.unwrap_err();
        assert!(matches!(err, EmbedError::EmptyInput));
        assert_eq!(mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn connection_refused_is_request_error() {
        let client = EmbeddingClient::new(EmbedConfig {
            api_base: "http://127.0.0.1:9/v1".into(),
            api_key: "test-key".into(),
            timeout_secs: 2,
            connect_timeout_secs: 1,
            ..Default::default()
        })
        .unwrap();

        let err = client.embed("hello").await.unwrap_err();
        assert!(matches!(
            err,
            EmbedError::Request(_) | EmbedError::Timeout(_)
        ));
    }
}
