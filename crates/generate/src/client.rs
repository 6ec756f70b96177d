use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::message::StreamEvent;
use crate::sse::SseDecoder;
use crate::{ChatMessage, ChunkStream, GenerateConfig, GenerateError, GenerationChunk, Generator};

const DONE_MARKER: &str = "[DONE]";

/// Streaming client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    cfg: GenerateConfig,
    endpoint: String,
}

impl ChatCompletionsClient {
    pub fn new(cfg: GenerateConfig) -> Result<Self, GenerateError> {
        cfg.validate()?;
        // No overall client timeout: it would also cap the body and cut long answers.
        let http = reqwest::Client::builder()
            .connect_timeout(cfg.connect_timeout())
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| {
                GenerateError::InvalidConfig(format!("failed to build HTTP client: {e}"))
            })?;
        let endpoint = cfg.endpoint();
        Ok(Self {
            http,
            cfg,
            endpoint,
        })
    }

    pub fn config(&self) -> &GenerateConfig {
        &self.cfg
    }

    fn payload(&self, messages: &[ChatMessage]) -> Value {
        let mut payload = json!({
            "model": self.cfg.model,
            "messages": messages,
            "stream": true,
        });
        if let Some(temperature) = self.cfg.temperature {
            payload["temperature"] = json!(temperature);
        }
        payload
    }
}

#[async_trait]
impl Generator for ChatCompletionsClient {
    async fn stream(&self, messages: &[ChatMessage]) -> Result<ChunkStream, GenerateError> {
        let request = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.cfg.api_key)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&self.payload(messages))
            .send();

        let response = match tokio::time::timeout(self.cfg.request_timeout(), request).await {
            Err(_) => {
                return Err(GenerateError::Timeout(format!(
                    "no response headers within {}s",
                    self.cfg.request_timeout_secs
                )))
            }
            Ok(Err(e)) if e.is_timeout() => return Err(GenerateError::Timeout(e.to_string())),
            Ok(Err(e)) => return Err(GenerateError::Request(e.to_string())),
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GenerateError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(model = %self.cfg.model, messages = messages.len(), "generation stream opened");
        let body = response
            .bytes_stream()
            .map(|read| read.map_err(|e| GenerateError::Stream(e.to_string())))
            .boxed();
        Ok(decode_event_stream(body, self.cfg.idle_timeout()))
    }
}

/// Turn a raw SSE body into a chunk stream.
///
/// Public so alternative transports can reuse the decoding and termination rules.
pub fn decode_event_stream(
    body: BoxStream<'static, Result<Bytes, GenerateError>>,
    idle_timeout: Duration,
) -> ChunkStream {
    let state = EventStreamState {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        idle_timeout,
        body_done: false,
        finished: false,
    };
    stream::unfold(state, |mut state| async move {
        let item = state.next_chunk().await?;
        Some((item, state))
    })
    .boxed()
}

struct EventStreamState {
    body: BoxStream<'static, Result<Bytes, GenerateError>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    idle_timeout: Duration,
    body_done: bool,
    finished: bool,
}

impl EventStreamState {
    async fn next_chunk(&mut self) -> Option<Result<GenerationChunk, GenerateError>> {
        loop {
            if self.finished {
                return None;
            }

            if let Some(payload) = self.pending.pop_front() {
                return self.handle_payload(payload);
            }

            if self.body_done {
                return self.fail(GenerateError::Truncated);
            }

            match tokio::time::timeout(self.idle_timeout, self.body.next()).await {
                Err(_) => {
                    return self.fail(GenerateError::Timeout(format!(
                        "no data for {}s",
                        self.idle_timeout.as_secs()
                    )))
                }
                Ok(Some(Err(e))) => return self.fail(e),
                Ok(Some(Ok(bytes))) => self.pending.extend(self.decoder.feed(&bytes)),
                Ok(None) => {
                    self.body_done = true;
                    self.pending.extend(self.decoder.finish());
                }
            }
        }
    }

    fn handle_payload(&mut self, payload: String) -> Option<Result<GenerationChunk, GenerateError>> {
        if payload.trim() == DONE_MARKER {
            self.finished = true;
            return None;
        }
        match serde_json::from_str::<StreamEvent>(&payload) {
            Ok(StreamEvent {
                error: Some(err), ..
            }) => self.fail(GenerateError::Upstream(
                err.message.unwrap_or_else(|| "unspecified error".into()),
            )),
            Ok(event) => Some(Ok(event.into_chunk())),
            Err(e) => self.fail(GenerateError::Decode(e.to_string())),
        }
    }

    fn fail(&mut self, err: GenerateError) -> Option<Result<GenerationChunk, GenerateError>> {
        tracing::warn!(error = %err, "generation stream failed");
        self.finished = true;
        Some(Err(err))
    }
}
