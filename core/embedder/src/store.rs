use anyhow::{bail, Result};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Minimal vector store interface (stand-in for a real vector database)
pub trait VectorStore: Send + Sync {
    fn add(&mut self, id: &str, embedding: Vec<f32>, metadata: HashMap<String, String>) -> Result<()>;
    fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<(String, f32, HashMap<String, String>)>>;
    fn update(&mut self, id: &str, embedding: Vec<f32>, metadata: HashMap<String, String>) -> Result<()>;
    fn delete(&mut self, id: &str) -> Result<()>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process store; every search is a full cosine scan.
#[derive(Default)]
pub struct InMemoryVectorStore {
    dimensions: Option<usize>,
    embeddings: HashMap<String, (Vec<f32>, HashMap<String, String>)>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects vectors of any other length
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions: Some(dimensions),
            embeddings: HashMap::new(),
        }
    }

    fn check_dimensions(&self, embedding: &[f32]) -> Result<()> {
        match self.dimensions {
            Some(expected) if expected != embedding.len() => bail!(
                "Embedding has {} dimensions, store expects {}",
                embedding.len(),
                expected
            ),
            _ => Ok(()),
        }
    }
}

impl VectorStore for InMemoryVectorStore {
    fn add(&mut self, id: &str, embedding: Vec<f32>, metadata: HashMap<String, String>) -> Result<()> {
        self.check_dimensions(&embedding)?;
        self.embeddings.insert(id.to_string(), (embedding, metadata));
        Ok(())
    }

    fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<(String, f32, HashMap<String, String>)>> {
        self.check_dimensions(query_embedding)?;

        let mut scores: Vec<(String, f32, HashMap<String, String>)> = self
            .embeddings
            .iter()
            .map(|(id, (embedding, metadata))| {
                (id.clone(), cosine_similarity(query_embedding, embedding), metadata.clone())
            })
            .collect();

        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scores.truncate(k);

        Ok(scores)
    }

    fn update(&mut self, id: &str, embedding: Vec<f32>, metadata: HashMap<String, String>) -> Result<()> {
        if !self.embeddings.contains_key(id) {
            bail!("No embedding stored for {}", id);
        }
        self.add(id, embedding, metadata)
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        self.embeddings.remove(id);
        Ok(())
    }

    fn len(&self) -> usize {
        self.embeddings.len()
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}
