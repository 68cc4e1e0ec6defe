//! Embedding functions.
//!
//! - [`ProviderEmbedder`] calls the model service's embeddings endpoint.
//! - [`HashingEmbedder`] hashes words into a fixed-size vector. It needs no
//!   network and is deterministic, which makes it the test default.

use async_trait::async_trait;
use henrybot_core::error::MemoryError;
use henrybot_core::provider::EmbeddingRequest;
use henrybot_core::{Embedder, Provider};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

/// Inputs sent per embeddings request.
const BATCH_SIZE: usize = 64;

pub struct ProviderEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
    dimensions: usize,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            provider,
            model: model.into(),
            dimensions,
        }
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    fn name(&self) -> &str {
        "provider"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MemoryError> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(BATCH_SIZE) {
            let response = self
                .provider
                .embed(EmbeddingRequest {
                    model: self.model.clone(),
                    inputs: batch.to_vec(),
                })
                .await
                .map_err(|e| MemoryError::EmbeddingFailed(e.to_string()))?;

            if response.embeddings.len() != batch.len() {
                return Err(MemoryError::EmbeddingFailed(format!(
                    "asked for {} embeddings, got {}",
                    batch.len(),
                    response.embeddings.len()
                )));
            }
            vectors.extend(response.embeddings);
        }

        debug!(model = %self.model, count = vectors.len(), "Embedded documents");
        Ok(vectors)
    }
}

/// Feature-hashing bag of words, L2-normalised.
///
/// Each lowercase alphanumeric token lands in one bucket chosen by its
/// SHA-256, with a sign bit to spread collisions. Texts sharing words end up
/// close under cosine similarity.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(512)
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MemoryError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        Ok(self.embed_text(text))
    }
}
