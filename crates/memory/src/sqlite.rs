//! SQLite vector index.
//!
//! One table, `documents`, keyed by the content hash. Embeddings are stored as
//! little-endian f32 blobs and ranked in process. WAL journaling lets
//! retrievals run while another run is writing a correction.

use crate::vector::{blob_to_embedding, embedding_to_blob, rank_by_similarity};
use async_trait::async_trait;
use chrono::Utc;
use henrybot_core::error::MemoryError;
use henrybot_core::{Document, VectorIndex};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

pub struct SqliteIndex {
    pool: SqlitePool,
}

impl SqliteIndex {
    /// Open (or create) the database file. Tables are created by
    /// [`VectorIndex::ensure_schema`], not here.
    pub async fn open(path: &Path) -> Result<Self, MemoryError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Storage(format!("Cannot create {}: {e}", parent.display()))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        info!(path = %path.display(), "SQLite knowledge index opened");
        Ok(Self { pool })
    }

    fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Result<(Document, Vec<f32>), MemoryError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| MemoryError::QueryFailed(format!("id column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| MemoryError::QueryFailed(format!("content column: {e}")))?;
        let metadata_json: String = row
            .try_get("metadata")
            .map_err(|e| MemoryError::QueryFailed(format!("metadata column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| MemoryError::QueryFailed(format!("created_at column: {e}")))?;
        let blob: Vec<u8> = row
            .try_get("embedding")
            .map_err(|e| MemoryError::QueryFailed(format!("embedding column: {e}")))?;

        let metadata: BTreeMap<String, serde_json::Value> = serde_json::from_str(&metadata_json)
            .map_err(|e| MemoryError::QueryFailed(format!("metadata of {id}: {e}")))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| MemoryError::QueryFailed(format!("created_at of {id}: {e}")))?;

        let document = Document {
            id,
            content,
            metadata,
            score: None,
            created_at,
        };
        Ok((document, blob_to_embedding(&blob)))
    }
}

#[async_trait]
impl VectorIndex for SqliteIndex {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn ensure_schema(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id          TEXT PRIMARY KEY NOT NULL,
                content     TEXT NOT NULL,
                metadata    TEXT NOT NULL DEFAULT '{}',
                embedding   BLOB NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("documents table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_created_at ON documents(created_at)")
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::MigrationFailed(format!("created_at index: {e}")))?;

        debug!("SQLite schema ready");
        Ok(())
    }

    async fn insert(&self, document: &Document, embedding: &[f32]) -> Result<bool, MemoryError> {
        let metadata = serde_json::to_string(&document.metadata)
            .map_err(|e| MemoryError::Storage(format!("Metadata serialization: {e}")))?;

        let result = sqlx::query(
            r#"
            INSERT INTO documents (id, content, metadata, embedding, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&document.id)
        .bind(&document.content)
        .bind(&metadata)
        .bind(embedding_to_blob(embedding))
        .bind(document.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(format!("INSERT failed: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    async fn similarity_search(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<Document>, MemoryError> {
        let rows = sqlx::query("SELECT id, content, metadata, embedding, created_at FROM documents")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("Document scan: {e}")))?;

        let entries = rows
            .iter()
            .map(Self::row_to_document)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rank_by_similarity(
            entries.iter().map(|(doc, emb)| (doc, emb.as_slice())),
            embedding,
            top_k,
        ))
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("COUNT failed: {e}")))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| MemoryError::QueryFailed(format!("count column: {e}")))?;
        Ok(n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn index(dir: &tempfile::TempDir) -> SqliteIndex {
        let index = SqliteIndex::open(&dir.path().join("kb").join("knowledge.db"))
            .await
            .unwrap();
        index.ensure_schema().await.unwrap();
        index
    }

    #[tokio::test]
    async fn schema_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let index = index(&dir).await;
        index.ensure_schema().await.unwrap();
        index.ensure_schema().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn insert_and_search_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let index = index(&dir).await;

        let doc = Document::correction("Band A's bassist is Jane Doe", &["https://example.org".into()]);
        assert!(index.insert(&doc, &[1.0, 0.0, 0.5]).await.unwrap());
        index
            .insert(&Document::new("unrelated"), &[0.0, 1.0, 0.0])
            .await
            .unwrap();

        let results = index.similarity_search(&[1.0, 0.0, 0.5], 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, doc.id);
        assert!(results[0].is_correction());
        assert_eq!(results[0].metadata["links"][0], "https://example.org");
        assert!((results[0].score.unwrap() - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn duplicate_insert_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let index = index(&dir).await;
        let doc = Document::new("Band A formed in 1987");

        assert!(index.insert(&doc, &[1.0]).await.unwrap());
        assert!(!index.insert(&doc, &[1.0]).await.unwrap());
        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let index = index(&dir).await;
            index.insert(&Document::new("persisted"), &[1.0]).await.unwrap();
        }
        let reopened = index(&dir).await;
        assert_eq!(reopened.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn corrupt_rows_fail_the_search() {
        let dir = tempfile::tempdir().unwrap();
        let index = index(&dir).await;
        index.insert(&Document::new("Band A formed in 1987"), &[1.0]).await.unwrap();

        sqlx::query("UPDATE documents SET metadata = 'not json'")
            .execute(&index.pool)
            .await
            .unwrap();
        let err = index.similarity_search(&[1.0], 4).await.unwrap_err();
        assert!(matches!(err, MemoryError::QueryFailed(ref m) if m.starts_with("metadata of")));

        sqlx::query("UPDATE documents SET metadata = '{}', created_at = 'yesterday'")
            .execute(&index.pool)
            .await
            .unwrap();
        let err = index.similarity_search(&[1.0], 4).await.unwrap_err();
        assert!(matches!(err, MemoryError::QueryFailed(ref m) if m.starts_with("created_at of")));
    }
}
