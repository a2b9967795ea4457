use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Model used when the embedder config leaves `model` unset.
pub const DEFAULT_EMBEDDING_MODEL: &str = "github_copilot/text-embedding-3-small";

/// Vector length requested when the embedder config leaves `embedding_dims` unset.
pub const DEFAULT_EMBEDDING_DIMS: usize = 1536;

// ============================================================================
// ULID and ID Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryId(pub String);

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn generate_memory_id() -> MemoryId {
    MemoryId(format!("mem_{}", ulid::Ulid::new()))
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("unknown memory action: {0:?} (expected add, search or update)")]
    UnknownMemoryAction(String),
}

// ============================================================================
// Memory Action
// ============================================================================

/// The memory operation an embedding is requested for.
///
/// Accepted on every embed call and carried into logs. It does not change
/// which model or dimensionality is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryAction {
    Add,
    Search,
    Update,
}

impl MemoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryAction::Add => "add",
            MemoryAction::Search => "search",
            MemoryAction::Update => "update",
        }
    }
}

impl fmt::Display for MemoryAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryAction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" => Ok(MemoryAction::Add),
            "search" => Ok(MemoryAction::Search),
            "update" => Ok(MemoryAction::Update),
            _ => Err(ConfigError::UnknownMemoryAction(s.to_string())),
        }
    }
}

// ============================================================================
// Embedder Configuration
// ============================================================================

/// Embedder options as supplied by the memory layer. Every field is optional;
/// defaults are filled in by [`EmbedderConfig::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedderConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub embedding_dims: Option<usize>,
}

impl EmbedderConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let model = std::env::var("COPILOT_EMBEDDING_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty());

        let embedding_dims = match std::env::var("COPILOT_EMBEDDING_DIMS") {
            Ok(raw) => Some(raw.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnv {
                var: "COPILOT_EMBEDDING_DIMS",
                value: raw.clone(),
            })?),
            Err(_) => None,
        };

        Ok(Self {
            model,
            embedding_dims,
        })
    }

    /// Apply defaults. Empty model names and zero dimensions count as unset.
    pub fn resolve(&self) -> EmbeddingSettings {
        let model = self
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_EMBEDDING_MODEL)
            .to_string();

        let embedding_dims = self
            .embedding_dims
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_EMBEDDING_DIMS);

        EmbeddingSettings {
            model,
            embedding_dims,
        }
    }
}

/// The `embedder` block of a memory layer config:
/// `{"provider": "github_copilot", "config": {"model": ..., "embedding_dims": ...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedderProviderConfig {
    pub provider: String,
    #[serde(default)]
    pub config: EmbedderConfig,
}

/// Resolved embedder settings. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddingSettings {
    model: String,
    embedding_dims: usize,
}

impl EmbeddingSettings {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn embedding_dims(&self) -> usize {
        self.embedding_dims
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        EmbedderConfig::default().resolve()
    }
}

// ============================================================================
// Embedding Wire Types (OpenAI-compatible router)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    pub model: String,
    pub data: Vec<EmbeddingItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<EmbeddingUsage>,
}

/// One entry of a response's `data` list. Entries carrying a numeric
/// `embedding` decode as [`EmbeddingItem::Embedding`]; any other object is
/// kept as a raw mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingItem {
    Embedding(EmbeddingData),
    Mapping(Map<String, Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingData {
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_generation() {
        let memory_id = generate_memory_id();
        assert!(memory_id.0.starts_with("mem_"));
        assert_eq!(memory_id.0.len(), 30); // "mem_" + 26 chars
    }

    #[test]
    fn test_config_defaults() {
        let settings = EmbedderConfig::default().resolve();
        assert_eq!(settings.model(), DEFAULT_EMBEDDING_MODEL);
        assert_eq!(settings.embedding_dims(), 1536);

        let settings = EmbedderConfig {
            model: Some(String::new()),
            embedding_dims: Some(0),
        }
        .resolve();
        assert_eq!(settings.model(), DEFAULT_EMBEDDING_MODEL);
        assert_eq!(settings.embedding_dims(), 1536);
    }

    #[test]
    fn test_config_overrides() {
        let settings = EmbedderConfig {
            model: Some("github_copilot/text-embedding-3-large".into()),
            embedding_dims: Some(256),
        }
        .resolve();
        assert_eq!(settings.model(), "github_copilot/text-embedding-3-large");
        assert_eq!(settings.embedding_dims(), 256);
    }

    #[test]
    fn test_config_from_env() {
        std::env::set_var("COPILOT_EMBEDDING_MODEL", "github_copilot/custom");
        std::env::set_var("COPILOT_EMBEDDING_DIMS", "512");

        let config = EmbedderConfig::from_env().unwrap();
        assert_eq!(config.model.as_deref(), Some("github_copilot/custom"));
        assert_eq!(config.embedding_dims, Some(512));

        std::env::set_var("COPILOT_EMBEDDING_DIMS", "lots");
        let err = EmbedderConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "COPILOT_EMBEDDING_DIMS", .. }));

        std::env::remove_var("COPILOT_EMBEDDING_MODEL");
        std::env::remove_var("COPILOT_EMBEDDING_DIMS");
    }

    #[test]
    fn test_provider_block_deserialization() {
        let block: EmbedderProviderConfig = serde_json::from_value(json!({
            "provider": "github_copilot",
            "config": {
                "model": "github_copilot/text-embedding-3-small",
                "embedding_dims": 1536
            }
        }))
        .unwrap();
        assert_eq!(block.provider, "github_copilot");
        assert_eq!(block.config.embedding_dims, Some(1536));

        let bare: EmbedderProviderConfig =
            serde_json::from_value(json!({ "provider": "github_copilot" })).unwrap();
        assert_eq!(bare.config, EmbedderConfig::default());
    }

    #[test]
    fn test_memory_action_parsing() {
        assert_eq!("add".parse::<MemoryAction>().unwrap(), MemoryAction::Add);
        assert_eq!(" Search ".parse::<MemoryAction>().unwrap(), MemoryAction::Search);
        assert_eq!(MemoryAction::Update.to_string(), "update");
        assert!("delete".parse::<MemoryAction>().is_err());

        let action: MemoryAction = serde_json::from_str("\"search\"").unwrap();
        assert_eq!(action, MemoryAction::Search);
    }

    #[test]
    fn test_request_serialization() {
        let request = EmbeddingRequest {
            model: DEFAULT_EMBEDDING_MODEL.into(),
            input: vec!["hello world".into()],
            dimensions: Some(1536),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "github_copilot/text-embedding-3-small",
                "input": ["hello world"],
                "dimensions": 1536
            })
        );

        let without_dims = EmbeddingRequest {
            dimensions: None,
            ..request
        };
        let value = serde_json::to_value(&without_dims).unwrap();
        assert!(value.get("dimensions").is_none());
    }

    #[test]
    fn test_response_item_variants() {
        let response: EmbeddingResponse = serde_json::from_value(json!({
            "object": "list",
            "model": "text-embedding-3-small",
            "data": [
                { "object": "embedding", "index": 0, "embedding": [0.5, -0.25] },
                { "index": 1, "embedding": "AAAAPw==" }
            ],
            "usage": { "prompt_tokens": 4, "total_tokens": 4 }
        }))
        .unwrap();

        assert!(matches!(
            &response.data[0],
            EmbeddingItem::Embedding(d) if d.embedding == vec![0.5, -0.25]
        ));
        assert!(matches!(&response.data[1], EmbeddingItem::Mapping(m) if m.contains_key("embedding")));
        assert_eq!(response.usage.unwrap().total_tokens, 4);
    }
}
