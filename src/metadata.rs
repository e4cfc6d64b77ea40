//! Durable document and booking records.
//!
//! Write-only from the core's point of view: finished records are handed
//! over for storage and never read back by the pipeline.

use std::path::PathBuf;

use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use crate::core::errors::CoreError;

#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    pub id: String,
    pub filename: String,
    pub strategy: String,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingRecord {
    pub session_id: String,
    pub name: String,
    pub email: String,
    pub date: String,
    pub time: String,
}

#[derive(Clone)]
pub struct MetadataStore {
    pool: SqlitePool,
}

impl MetadataStore {
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
            .map_err(CoreError::storage)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), CoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                strategy TEXT NOT NULL,
                chunk_count INTEGER NOT NULL,
                uploaded_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS bookings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                date TEXT NOT NULL,
                time TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;

        Ok(())
    }

    pub async fn save_document(&self, record: &DocumentRecord) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO documents (id, filename, strategy, chunk_count) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&record.id)
        .bind(&record.filename)
        .bind(&record.strategy)
        .bind(record.chunk_count as i64)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;
        Ok(())
    }

    pub async fn save_booking(&self, record: &BookingRecord) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO bookings (session_id, name, email, date, time) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&record.session_id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.date)
        .bind(&record.time)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn booking_count(&self) -> Result<i64, CoreError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(&self.pool)
            .await
            .map_err(CoreError::storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> MetadataStore {
        let tmp =
            std::env::temp_dir().join(format!("docent-meta-test-{}.db", uuid::Uuid::new_v4()));
        MetadataStore::with_path(tmp).await.unwrap()
    }

    #[tokio::test]
    async fn saves_documents_and_bookings() {
        let store = test_store().await;

        store
            .save_document(&DocumentRecord {
                id: "doc-1".to_string(),
                filename: "handbook.txt".to_string(),
                strategy: "sentence".to_string(),
                chunk_count: 12,
            })
            .await
            .unwrap();

        store
            .save_booking(&BookingRecord {
                session_id: "s1".to_string(),
                name: "John".to_string(),
                email: "john@example.com".to_string(),
                date: "2025-03-15".to_string(),
                time: "10:00".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(store.booking_count().await.unwrap(), 1);
    }
}
