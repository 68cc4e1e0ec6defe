//! In-memory index, for tests and ephemeral sessions.

use crate::vector::rank_by_similarity;
use async_trait::async_trait;
use henrybot_core::error::MemoryError;
use henrybot_core::{Document, VectorIndex};
use std::collections::HashSet;
use tokio::sync::RwLock;

#[derive(Default)]
struct Rows {
    ids: HashSet<String>,
    entries: Vec<(Document, Vec<f32>)>,
}

/// Documents and their embeddings in a Vec behind a `RwLock`.
/// Searches share the read lock; only inserts take the write lock.
#[derive(Default)]
pub struct InMemoryIndex {
    rows: RwLock<Rows>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn ensure_schema(&self) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn insert(&self, document: &Document, embedding: &[f32]) -> Result<bool, MemoryError> {
        let mut rows = self.rows.write().await;
        if !rows.ids.insert(document.id.clone()) {
            return Ok(false);
        }
        rows.entries.push((document.clone(), embedding.to_vec()));
        Ok(true)
    }

    async fn similarity_search(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<Document>, MemoryError> {
        let rows = self.rows.read().await;
        Ok(rank_by_similarity(
            rows.entries.iter().map(|(doc, emb)| (doc, emb.as_slice())),
            embedding,
            top_k,
        ))
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.rows.read().await.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_and_search() {
        let index = InMemoryIndex::new();
        index
            .insert(&Document::new("Band A lineup"), &[1.0, 0.0])
            .await
            .unwrap();
        index
            .insert(&Document::new("Band B discography"), &[0.0, 1.0])
            .await
            .unwrap();

        let results = index.similarity_search(&[0.9, 0.1], 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "Band A lineup");
        assert!(results[0].score.is_some());
    }

    #[tokio::test]
    async fn duplicate_ids_are_ignored() {
        let index = InMemoryIndex::new();
        let doc = Document::new("same text");
        assert!(index.insert(&doc, &[1.0]).await.unwrap());
        assert!(!index.insert(&doc, &[1.0]).await.unwrap());
        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_index_returns_nothing() {
        let index = InMemoryIndex::new();
        assert!(index.similarity_search(&[1.0], 4).await.unwrap().is_empty());
    }
}
