//! The knowledge store: an embedder plus a vector index, with an explicit
//! readiness step.
//!
//! Construction is pure. [`KnowledgeStore::initialize`] must be awaited once
//! before any retrieval or write; every other call fails with
//! [`MemoryError::NotInitialized`] until it has completed.

use henrybot_core::error::MemoryError;
use henrybot_core::{Document, Embedder, VectorIndex};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{Instrument, debug, info};

/// Documents returned per query unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 4;

struct Inner {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    ready: OnceCell<()>,
    span: tracing::Span,
}

/// Cheap to clone; clones share the same index and readiness state.
#[derive(Clone)]
pub struct KnowledgeStore {
    inner: Arc<Inner>,
    top_k: usize,
}

impl KnowledgeStore {
    /// `span` scopes every log line the store emits.
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        span: tracing::Span,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                index,
                embedder,
                ready: OnceCell::new(),
                span,
            }),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Ensure the index schema exists. Idempotent; concurrent callers wait
    /// for the same initialization.
    pub async fn initialize(&self) -> Result<(), MemoryError> {
        let inner = &self.inner;
        inner
            .ready
            .get_or_try_init(|| {
                async {
                    inner.index.ensure_schema().await?;
                    let documents = inner.index.count().await?;
                    info!(
                        index = inner.index.name(),
                        embedder = inner.embedder.name(),
                        documents,
                        "Knowledge store ready"
                    );
                    Ok::<(), MemoryError>(())
                }
                .instrument(inner.span.clone())
            })
            .await?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.ready.initialized()
    }

    fn ensure_ready(&self) -> Result<(), MemoryError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(MemoryError::NotInitialized)
        }
    }

    /// A read-only handle for the search tool.
    pub fn retriever(&self) -> Result<Retriever, MemoryError> {
        self.ensure_ready()?;
        Ok(Retriever {
            store: self.clone(),
        })
    }

    /// The embedding function, for tools that rank their own text.
    pub fn embedder(&self) -> Result<Arc<dyn Embedder>, MemoryError> {
        self.ensure_ready()?;
        Ok(self.inner.embedder.clone())
    }

    /// Nearest documents to `query`, best first.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Document>, MemoryError> {
        self.ensure_ready()?;
        let inner = &self.inner;
        async {
            let embedding = inner.embedder.embed_query(query).await?;
            let documents = inner.index.similarity_search(&embedding, self.top_k).await?;
            debug!(query_len = query.len(), hits = documents.len(), "Retrieved documents");
            Ok(documents)
        }
        .instrument(inner.span.clone())
        .await
    }

    /// Embed and append. Returns how many documents were new; content that
    /// is already stored is skipped.
    pub async fn add_documents(&self, documents: Vec<Document>) -> Result<usize, MemoryError> {
        self.ensure_ready()?;

        let mut seen = HashSet::new();
        let documents: Vec<Document> = documents
            .into_iter()
            .filter(|d| seen.insert(d.id.clone()))
            .collect();
        if documents.is_empty() {
            return Ok(0);
        }

        let inner = &self.inner;
        async {
            let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
            let embeddings = inner.embedder.embed_documents(&texts).await?;
            if embeddings.len() != documents.len() {
                return Err(MemoryError::EmbeddingFailed(format!(
                    "{} documents but {} embeddings",
                    documents.len(),
                    embeddings.len()
                )));
            }

            let mut inserted = 0;
            for (document, embedding) in documents.iter().zip(&embeddings) {
                if inner.index.insert(document, embedding).await? {
                    inserted += 1;
                } else {
                    debug!(id = %document.id, "Document already stored");
                }
            }

            info!(submitted = documents.len(), inserted, "Added documents");
            Ok(inserted)
        }
        .instrument(inner.span.clone())
        .await
    }

    pub async fn count(&self) -> Result<usize, MemoryError> {
        self.ensure_ready()?;
        self.inner.index.count().await
    }
}

/// Query-only view of the store.
#[derive(Clone)]
pub struct Retriever {
    store: KnowledgeStore,
}

impl Retriever {
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Document>, MemoryError> {
        self.store.retrieve(query).await
    }
}
