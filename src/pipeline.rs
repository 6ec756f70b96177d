use std::sync::Arc;

use embed::{Embedder, EmbeddingClient};
use generate::{ChatCompletionsClient, Generator};
use vector::{SimilarityIndex, VectorIndexClient};

use crate::config::{PipelineConfig, RagConfig};
use crate::context::augment_turn;
use crate::prompt::{PromptMessages, assemble_prompt};
use crate::{Conversation, MetricsSpan, RagError, ResponseStreamer};

/// The request pipeline: embed, retrieve, compose, assemble, generate.
///
/// Holds one handle per external service. Handles are shared across requests;
/// everything a request produces lives only for that request.
#[derive(Clone)]
pub struct RagPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn SimilarityIndex>,
    generator: Arc<dyn Generator>,
    config: PipelineConfig,
}

impl RagPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn SimilarityIndex>,
        generator: Arc<dyn Generator>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            config,
        }
    }

    /// Build the HTTP clients described by `config`.
    ///
    /// Credentials are checked first, so a missing key fails here without any
    /// network traffic. The index host lookup (when no host is pinned) is the
    /// only call made at construction.
    pub async fn from_config(config: &RagConfig) -> Result<Self, RagError> {
        config.validate()?;
        let embedder = EmbeddingClient::new(config.embed.clone())
            .map_err(|e| RagError::Configuration(e.to_string()))?;
        let generator = ChatCompletionsClient::new(config.generate.clone())
            .map_err(|e| RagError::Configuration(e.to_string()))?;
        let index = VectorIndexClient::connect(config.index.clone()).await?;

        tracing::info!(
            embed_model = %config.embed.model,
            chat_model = %config.generate.model,
            namespace = %index.namespace(),
            top_k = config.pipeline.top_k,
            "rag pipeline ready"
        );
        Ok(Self::new(
            Arc::new(embedder),
            Arc::new(index),
            Arc::new(generator),
            config.pipeline.clone(),
        ))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run retrieval and build the message list for `conversation`.
    ///
    /// Exactly one embedding call (on the active turn) and one index query.
    pub async fn prepare(&self, conversation: &Conversation) -> Result<PromptMessages, RagError> {
        let active = conversation.active_turn();

        let span = MetricsSpan::start();
        let embedding = match self.embedder.embed(&active.content).await {
            Ok(embedding) => {
                tracing::debug!(dim = embedding.dim(), elapsed = ?span.elapsed(), "query embedded");
                span.record_embed(Ok(()));
                embedding
            }
            Err(err) => {
                tracing::warn!(error = %err, "embedding failed");
                span.record_embed(Err(&err));
                return Err(err.into());
            }
        };

        let span = MetricsSpan::start();
        let records = match self.index.query(embedding.as_slice(), self.config.top_k).await {
            Ok(records) => {
                tracing::debug!(
                    matches = records.len(),
                    top_k = self.config.top_k,
                    elapsed = ?span.elapsed(),
                    "similar reviews retrieved"
                );
                span.record_index(Ok(()), records.len());
                records
            }
            Err(err) => {
                tracing::warn!(error = %err, "index query failed");
                span.record_index(Err(&err), 0);
                return Err(err.into());
            }
        };

        let augmented = augment_turn(&active.content, &records);
        Ok(assemble_prompt(
            self.config.system_prompt(),
            conversation,
            augmented,
        ))
    }

    /// Prepare the prompt, open generation, and wait for the first fragment.
    ///
    /// Any error returned here happened before the answer started, so the
    /// caller can still report it as a plain failure.
    pub async fn answer(&self, conversation: &Conversation) -> Result<ResponseStreamer, RagError> {
        let prompt = self.prepare(conversation).await?;

        let span = MetricsSpan::start();
        let opened = match self.generator.stream(prompt.as_slice()).await {
            Ok(chunks) => ResponseStreamer::start(chunks).await,
            Err(err) => Err(RagError::Generation(err)),
        };
        match opened {
            Ok(streamer) => {
                tracing::debug!(elapsed = ?span.elapsed(), "generation started");
                span.record_generate(Ok(()));
                Ok(streamer)
            }
            Err(err) => {
                tracing::warn!(error = %err, "generation failed before streaming");
                span.record_generate(Err(&err));
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
