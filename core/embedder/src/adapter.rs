/// GitHub Copilot embedder for the memory layer

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use copilot_embedder_schemas::{
    EmbedderConfig, EmbedderProviderConfig, EmbeddingRequest, EmbeddingSettings, MemoryAction,
};
use tracing::{debug, error, info};

use crate::backend::{EmbeddingBackend, RouterBackend, RouterConfig};
use crate::error::UpstreamEmbeddingError;
use crate::response::{decode_batch, decode_embedding, EmbeddingBatch, EmbeddingOutput};

/// Provider name the memory layer uses for this embedder.
pub const COPILOT_PROVIDER: &str = "github_copilot";

/// Embedding interface used by memory code. Always yields a numeric vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_vector(&self, text: &str, action: Option<MemoryAction>) -> Result<Vec<f32>>;
    fn dimensions(&self) -> usize;
}

/// Replace newlines with spaces; the upstream model degrades on embedded newlines.
pub fn normalize_text(text: &str) -> String {
    text.replace('\n', " ")
}

/// Adapter turning text into embeddings via GitHub Copilot.
///
/// Settings are resolved once here and never change afterwards. No network
/// or auth work happens at construction; the router handles OAuth2.
pub struct CopilotEmbedding {
    backend: Box<dyn EmbeddingBackend>,
    settings: EmbeddingSettings,
}

impl CopilotEmbedding {
    pub fn new(backend: Box<dyn EmbeddingBackend>, config: Option<EmbedderConfig>) -> Self {
        let settings = config.unwrap_or_default().resolve();
        info!(
            "Copilot embedder ready (model: {}, dims: {})",
            settings.model(),
            settings.embedding_dims()
        );

        Self { backend, settings }
    }

    /// Build from a memory layer `embedder` block; the provider must be `github_copilot`.
    pub fn from_provider_config(
        backend: Box<dyn EmbeddingBackend>,
        block: &EmbedderProviderConfig,
    ) -> Result<Self> {
        if block.provider != COPILOT_PROVIDER {
            bail!(
                "Unsupported embedder provider {:?} (expected {:?})",
                block.provider,
                COPILOT_PROVIDER
            );
        }

        Ok(Self::new(backend, Some(block.config.clone())))
    }

    /// Router backend and embedder settings both taken from the environment
    pub fn from_env() -> Result<Self> {
        let backend = RouterBackend::new(RouterConfig::from_env()?)?;
        let config = EmbedderConfig::from_env()?;
        Ok(Self::new(Box::new(backend), Some(config)))
    }

    pub fn settings(&self) -> &EmbeddingSettings {
        &self.settings
    }

    fn request_for(&self, inputs: Vec<String>) -> EmbeddingRequest {
        EmbeddingRequest {
            model: self.settings.model().to_string(),
            input: inputs,
            dimensions: Some(self.settings.embedding_dims()),
        }
    }

    /// Get the embedding for one text.
    ///
    /// `memory_action` is accepted for every call and only recorded in logs.
    /// Unknown response shapes come back as [`EmbeddingOutput::Passthrough`]
    /// rather than as an error.
    pub async fn embed(
        &self,
        text: &str,
        memory_action: Option<MemoryAction>,
    ) -> Result<EmbeddingOutput, UpstreamEmbeddingError> {
        debug!(
            "Embedding {} chars (action: {})",
            text.len(),
            memory_action.map_or("none", |a| a.as_str())
        );

        let request = self.request_for(vec![normalize_text(text)]);
        let raw = self.backend.embed(&request).await.map_err(|e| {
            error!("Copilot embedding request failed: {:#}", e);
            UpstreamEmbeddingError::from(e)
        })?;

        Ok(decode_embedding(raw))
    }

    /// Embed several texts with one router call.
    pub async fn embed_batch(
        &self,
        texts: &[&str],
        memory_action: Option<MemoryAction>,
    ) -> Result<EmbeddingBatch, UpstreamEmbeddingError> {
        debug!(
            "Embedding batch of {} texts (action: {})",
            texts.len(),
            memory_action.map_or("none", |a| a.as_str())
        );

        let inputs = texts.iter().map(|t| normalize_text(t)).collect();
        let request = self.request_for(inputs);
        let raw = self.backend.embed(&request).await.map_err(|e| {
            error!("Copilot batch embedding request failed: {:#}", e);
            UpstreamEmbeddingError::from(e)
        })?;

        Ok(decode_batch(raw))
    }
}

#[async_trait]
impl Embedder for CopilotEmbedding {
    async fn embed_vector(&self, text: &str, action: Option<MemoryAction>) -> Result<Vec<f32>> {
        match self.embed(text, action).await? {
            EmbeddingOutput::Vector(vector) => Ok(vector),
            EmbeddingOutput::Passthrough(value) => {
                let preview: String = value.to_string().chars().take(120).collect();
                Err(anyhow!(
                    "Embedding response was not a numeric vector: {}",
                    preview
                ))
            }
        }
    }

    fn dimensions(&self) -> usize {
        self.settings.embedding_dims()
    }
}
