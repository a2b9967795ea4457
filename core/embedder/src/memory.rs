/// Small memory index driving an `Embedder` through add/search/update.
/// Used by the demo binaries to exercise the adapter the way a memory layer does.

use anyhow::{anyhow, Result};
use chrono::Utc;
use copilot_embedder_schemas::{generate_memory_id, MemoryAction, MemoryId};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::adapter::Embedder;
use crate::store::VectorStore;

#[derive(Debug, Clone, Serialize)]
pub struct MemoryRecord {
    pub id: MemoryId,
    pub text: String,
    pub metadata: HashMap<String, String>,
    pub created_at: String, // RFC3339
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredMemory {
    pub memory: MemoryRecord,
    pub score: f32,
}

pub struct MemoryIndex {
    embedder: Box<dyn Embedder>,
    store: Box<dyn VectorStore>,
    records: HashMap<MemoryId, MemoryRecord>,
}

impl MemoryIndex {
    pub fn new(embedder: Box<dyn Embedder>, store: Box<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            records: HashMap::new(),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    pub async fn add(&mut self, text: &str, metadata: HashMap<String, String>) -> Result<MemoryId> {
        let id = generate_memory_id();
        let embedding = self.embedder.embed_vector(text, Some(MemoryAction::Add)).await?;

        self.store.add(&id.0, embedding, metadata.clone())?;
        self.records.insert(
            id.clone(),
            MemoryRecord {
                id: id.clone(),
                text: text.to_string(),
                metadata,
                created_at: Utc::now().to_rfc3339(),
                updated_at: None,
            },
        );

        info!("Added memory {}", id);
        Ok(id)
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredMemory>> {
        let embedding = self
            .embedder
            .embed_vector(query, Some(MemoryAction::Search))
            .await?;

        let hits = self.store.search(&embedding, limit)?;
        debug!("Search returned {} hits", hits.len());

        Ok(hits
            .into_iter()
            .filter_map(|(id, score, _)| {
                self.records.get(&MemoryId(id)).map(|memory| ScoredMemory {
                    memory: memory.clone(),
                    score,
                })
            })
            .collect())
    }

    pub async fn update(&mut self, id: &MemoryId, text: &str) -> Result<()> {
        if !self.records.contains_key(id) {
            return Err(anyhow!("Memory {} not found", id));
        }

        let embedding = self
            .embedder
            .embed_vector(text, Some(MemoryAction::Update))
            .await?;

        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| anyhow!("Memory {} not found", id))?;
        self.store.update(&id.0, embedding, record.metadata.clone())?;
        record.text = text.to_string();
        record.updated_at = Some(Utc::now().to_rfc3339());

        info!("Updated memory {}", id);
        Ok(())
    }

    pub fn delete(&mut self, id: &MemoryId) -> Result<()> {
        self.store.delete(&id.0)?;
        self.records.remove(id);
        Ok(())
    }

    pub fn get(&self, id: &MemoryId) -> Option<&MemoryRecord> {
        self.records.get(id)
    }

    /// All memories, oldest first
    pub fn get_all(&self) -> Vec<&MemoryRecord> {
        let mut all: Vec<&MemoryRecord> = self.records.values().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.0.cmp(&b.id.0)));
        all
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryVectorStore;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Letter-frequency embedding, good enough to rank obvious matches.
    struct LetterEmbedder {
        actions: Arc<Mutex<Vec<Option<MemoryAction>>>>,
    }

    #[async_trait]
    impl Embedder for LetterEmbedder {
        async fn embed_vector(&self, text: &str, action: Option<MemoryAction>) -> Result<Vec<f32>> {
            self.actions.lock().unwrap().push(action);
            let mut embedding = vec![0.0; 26];
            for ch in text.to_lowercase().chars().filter(|c| c.is_ascii_lowercase()) {
                embedding[(ch as u8 - b'a') as usize] += 1.0;
            }
            Ok(embedding)
        }

        fn dimensions(&self) -> usize {
            26
        }
    }

    fn index() -> (MemoryIndex, Arc<Mutex<Vec<Option<MemoryAction>>>>) {
        let actions = Arc::new(Mutex::new(Vec::new()));
        let embedder = LetterEmbedder {
            actions: actions.clone(),
        };
        let index = MemoryIndex::new(
            Box::new(embedder),
            Box::new(InMemoryVectorStore::with_dimensions(26)),
        );
        (index, actions)
    }

    #[tokio::test]
    async fn test_add_and_search() {
        let (mut index, actions) = index();
        let rust = index.add("rust rust rust", HashMap::new()).await.unwrap();
        index.add("python typescript", HashMap::new()).await.unwrap();

        let results = index.search("rust", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].memory.id, rust);

        let recorded = actions.lock().unwrap().clone();
        assert_eq!(
            recorded,
            vec![
                Some(MemoryAction::Add),
                Some(MemoryAction::Add),
                Some(MemoryAction::Search)
            ]
        );
    }

    #[tokio::test]
    async fn test_update_reembeds() {
        let (mut index, actions) = index();
        let id = index.add("vscode", HashMap::new()).await.unwrap();
        index.update(&id, "zzz").await.unwrap();

        let record = index.get(&id).unwrap();
        assert_eq!(record.text, "zzz");
        assert!(record.updated_at.is_some());
        assert_eq!(actions.lock().unwrap().last(), Some(&Some(MemoryAction::Update)));

        let missing = MemoryId("mem_missing".into());
        assert!(index.update(&missing, "text").await.is_err());
    }

    #[tokio::test]
    async fn test_get_all_and_delete() {
        let (mut index, _) = index();
        let first = index.add("first", HashMap::new()).await.unwrap();
        index.add("second", HashMap::new()).await.unwrap();
        assert_eq!(index.get_all().len(), 2);
        assert_eq!(index.dimensions(), 26);

        index.delete(&first).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.get(&first).is_none());
        assert!(index.search("first", 5).await.unwrap().iter().all(|s| s.memory.id != first));
    }
}
