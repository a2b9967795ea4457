/// Outbound embedding calls to the LLM router.
/// The router (e.g. a LiteLLM proxy) owns provider selection and the
/// GitHub Copilot OAuth2 flow; this side only speaks its OpenAI-style API.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use copilot_embedder_schemas::{ConfigError, EmbeddingRequest};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::response::RawEmbeddingResponse;

/// A single embedding request against an external provider.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    async fn embed(&self, request: &EmbeddingRequest) -> Result<RawEmbeddingResponse>;
}

#[async_trait]
impl<B: EmbeddingBackend + ?Sized> EmbeddingBackend for Arc<B> {
    async fn embed(&self, request: &EmbeddingRequest) -> Result<RawEmbeddingResponse> {
        (**self).embed(request).await
    }
}

/// Connection settings for the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl RouterConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("EMBEDDING_ROUTER_URL")
            .unwrap_or_else(|_| "http://localhost:4000".to_string());

        let api_key = std::env::var("EMBEDDING_ROUTER_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());

        let timeout_secs = match std::env::var("EMBEDDING_ROUTER_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                var: "EMBEDDING_ROUTER_TIMEOUT_SECS",
                value: raw.clone(),
            })?,
            Err(_) => 30,
        };

        Ok(Self {
            base_url,
            api_key,
            timeout_secs,
        })
    }
}

/// HTTP backend posting to `{base_url}/v1/embeddings`
pub struct RouterBackend {
    config: RouterConfig,
    client: Client,
}

impl RouterBackend {
    pub fn new(config: RouterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client for embedding router")?;

        Ok(Self { config, client })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1/embeddings", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl EmbeddingBackend for RouterBackend {
    async fn embed(&self, request: &EmbeddingRequest) -> Result<RawEmbeddingResponse> {
        let endpoint = self.endpoint();
        debug!(
            "POST {} (model: {}, inputs: {})",
            endpoint,
            request.model,
            request.input.len()
        );

        let mut builder = self.client.post(&endpoint).json(request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to reach embedding router at {}", endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Embedding router error ({}): {}", status, error_text));
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse embedding router response")?;

        Ok(RawEmbeddingResponse::classify(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_config_from_env() {
        std::env::set_var("EMBEDDING_ROUTER_URL", "http://router.local:4000/");
        std::env::set_var("EMBEDDING_ROUTER_API_KEY", "sk-local");
        std::env::set_var("EMBEDDING_ROUTER_TIMEOUT_SECS", "5");

        let config = RouterConfig::from_env().unwrap();
        assert_eq!(config.base_url, "http://router.local:4000/");
        assert_eq!(config.api_key.as_deref(), Some("sk-local"));
        assert_eq!(config.timeout_secs, 5);

        std::env::set_var("EMBEDDING_ROUTER_TIMEOUT_SECS", "soon");
        assert!(RouterConfig::from_env().is_err());

        std::env::remove_var("EMBEDDING_ROUTER_URL");
        std::env::remove_var("EMBEDDING_ROUTER_API_KEY");
        std::env::remove_var("EMBEDDING_ROUTER_TIMEOUT_SECS");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let backend = RouterBackend::new(RouterConfig {
            base_url: "http://router.local:4000/".into(),
            ..RouterConfig::default()
        })
        .unwrap();
        assert_eq!(backend.endpoint(), "http://router.local:4000/v1/embeddings");
    }
}
