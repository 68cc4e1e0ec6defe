//! Knowledge types: documents, embedders and vector indexes.
//!
//! A [`Document`] is identified by the SHA-256 of its content, so the same
//! text always maps to the same id and storing it twice is a no-op.

use crate::error::MemoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Metadata key marking how a document entered the store.
pub const KIND_KEY: &str = "kind";

/// Value of [`KIND_KEY`] for user-asserted corrections.
pub const KIND_CORRECTION: &str = "correction";

/// A unit of knowledge the agent can retrieve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Hex SHA-256 of `content`
    pub id: String,

    pub content: String,

    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,

    /// Similarity to the query, set only on retrieval results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: content_id(&content),
            content,
            metadata: BTreeMap::new(),
            score: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// A correction record: the corrected statement followed by its sources.
    pub fn correction(correction: &str, links: &[String]) -> Self {
        let content = format!(
            "{}\n\nUseful resources: {}",
            correction.trim(),
            links.join("\n")
        );
        Self::new(content)
            .with_metadata(KIND_KEY, serde_json::Value::from(KIND_CORRECTION))
            .with_metadata("links", serde_json::json!(links))
    }

    pub fn is_correction(&self) -> bool {
        self.metadata.get(KIND_KEY).and_then(|v| v.as_str()) == Some(KIND_CORRECTION)
    }
}

/// Content-derived document id.
pub fn content_id(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Turns text into vectors. Documents and queries may embed differently.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// Length of every vector this embedder produces.
    fn dimensions(&self) -> usize;

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MemoryError>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| MemoryError::EmbeddingFailed("embedder returned no vector".into()))
    }
}

/// A durable key → vector store.
///
/// Inserts are append-only and keyed by document id; inserting an id that
/// already exists leaves the stored row untouched.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    fn name(&self) -> &str;

    /// Create tables/collections if missing. Must be idempotent.
    async fn ensure_schema(&self) -> Result<(), MemoryError>;

    /// Store a document with its embedding. Returns false if the id existed.
    async fn insert(&self, document: &Document, embedding: &[f32]) -> Result<bool, MemoryError>;

    /// The `top_k` nearest documents by cosine similarity, best first,
    /// each with `score` set.
    async fn similarity_search(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<Document>, MemoryError>;

    async fn count(&self) -> Result<usize, MemoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_content_hash() {
        let a = Document::new("Band A formed in 1987.");
        let b = Document::new("Band A formed in 1987.");
        let c = Document::new("Band A formed in 1988.");
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id.len(), 64);
    }

    #[test]
    fn correction_layout() {
        let doc = Document::correction(
            "X",
            &["https://url1".to_string(), "https://url2".to_string()],
        );
        assert_eq!(
            doc.content,
            "X\n\nUseful resources: https://url1\nhttps://url2"
        );
        assert!(doc.is_correction());
        assert_eq!(doc.metadata["links"][1], "https://url2");
    }

    #[test]
    fn plain_document_is_not_correction() {
        assert!(!Document::new("lineup notes").is_correction());
    }
}
