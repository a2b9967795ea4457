pub mod adapter;
pub mod backend;
pub mod error;
pub mod memory;
pub mod response;
pub mod store;

pub use adapter::{normalize_text, CopilotEmbedding, Embedder, COPILOT_PROVIDER};
pub use backend::{EmbeddingBackend, RouterBackend, RouterConfig};
pub use error::UpstreamEmbeddingError;
pub use memory::{MemoryIndex, MemoryRecord, ScoredMemory};
pub use response::{decode_batch, decode_embedding, EmbeddingBatch, EmbeddingOutput, RawEmbeddingResponse};
pub use store::{cosine_similarity, InMemoryVectorStore, VectorStore};
