use thiserror::Error;

/// The one failure `embed` surfaces: the delegated router call went wrong.
///
/// The display text carries the full message chain of the underlying
/// failure and `source()` returns it for callers that want to inspect it.
#[derive(Debug, Error)]
#[error("GitHub Copilot embedding failed: {message}")]
pub struct UpstreamEmbeddingError {
    message: String,
    #[source]
    source: anyhow::Error,
}

impl UpstreamEmbeddingError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<anyhow::Error> for UpstreamEmbeddingError {
    fn from(err: anyhow::Error) -> Self {
        Self {
            message: format!("{:#}", err),
            source: err,
        }
    }
}
