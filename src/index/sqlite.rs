//! SQLite-backed vector index.
//!
//! In-process backend: metadata in a table, embeddings as little-endian
//! f32 BLOBs, brute-force cosine similarity at query time. Fine for local
//! runs and tests; the Pinecone backend covers hosted deployments.

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::{cosine_similarity, IndexedVector, RetrievedMatch, VectorIndex};
use crate::core::errors::CoreError;

pub struct SqliteIndex {
    pool: SqlitePool,
}

impl SqliteIndex {
    pub async fn with_path(db_path: PathBuf) -> Result<Self, CoreError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(CoreError::index)?;

        let index = Self { pool };
        index.init_schema().await?;
        Ok(index)
    }

    async fn init_schema(&self) -> Result<(), CoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS vectors (
                id TEXT PRIMARY KEY,
                doc_id TEXT NOT NULL,
                filename TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                text TEXT NOT NULL,
                strategy TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(CoreError::index)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_vectors_doc ON vectors(doc_id)")
            .execute(&self.pool)
            .await
            .map_err(CoreError::index)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }
}

#[async_trait]
impl VectorIndex for SqliteIndex {
    async fn upsert(&self, vectors: Vec<IndexedVector>) -> Result<(), CoreError> {
        if vectors.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(CoreError::index)?;

        for vector in &vectors {
            let blob = Self::serialize_embedding(&vector.embedding);

            sqlx::query(
                "INSERT OR REPLACE INTO vectors (id, doc_id, filename, chunk_index, text, strategy, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(&vector.id)
            .bind(&vector.metadata.doc_id)
            .bind(&vector.metadata.filename)
            .bind(vector.metadata.chunk_index as i64)
            .bind(&vector.metadata.text)
            .bind(&vector.metadata.strategy)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(CoreError::index)?;
        }

        tx.commit().await.map_err(CoreError::index)?;
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedMatch>, CoreError> {
        let rows = sqlx::query("SELECT text, embedding FROM vectors")
            .fetch_all(&self.pool)
            .await
            .map_err(CoreError::index)?;

        let mut scored: Vec<RetrievedMatch> = rows
            .iter()
            .map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                let stored = Self::deserialize_embedding(&embedding_bytes);
                RetrievedMatch {
                    text: row.get("text"),
                    score: cosine_similarity(embedding, &stored),
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k.max(1));

        Ok(scored)
    }
}
