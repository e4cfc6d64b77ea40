//! Per-session conversation memory.
//!
//! Each session's history is stored as one JSON blob of `{role, content}`
//! turns plus an expiry timestamp. Append is read-modify-write over the
//! whole blob: it trims to the newest turns and refreshes the expiry for
//! the entire session. There is no per-session lock — two concurrent
//! appends to the same session race and the last write wins on the whole
//! history. That matches the source system's behavior and is accepted
//! rather than guarded.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use crate::core::config::MemorySettings;
use crate::core::errors::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used when rendering history into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

#[derive(Clone)]
pub struct ConversationStore {
    pool: SqlitePool,
    max_turns: usize,
    ttl: Duration,
}

impl ConversationStore {
    pub async fn with_path(db_path: PathBuf, cfg: &MemorySettings) -> Result<Self, CoreError> {
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

        let store = Self {
            pool,
            // One exchange = user turn + assistant turn.
            max_turns: cfg.max_exchanges * 2,
            ttl: Duration::seconds(cfg.ttl_secs),
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), CoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS conversations (
                session_id TEXT PRIMARY KEY,
                history TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;

        Ok(())
    }

    /// Ordered history for a session. Expired or unknown sessions read as
    /// empty; expired rows are dropped on the way out.
    pub async fn get(&self, session_id: &str) -> Result<Vec<ConversationTurn>, CoreError> {
        let row = sqlx::query("SELECT history, expires_at FROM conversations WHERE session_id = ?1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(CoreError::storage)?;

        let Some(row) = row else {
            return Ok(Vec::new());
        };

        let expires_at: String = row.get("expires_at");
        let expired = DateTime::parse_from_rfc3339(&expires_at)
            .map(|t| t.with_timezone(&Utc) <= Utc::now())
            .unwrap_or(true);

        if expired {
            self.clear(session_id).await?;
            return Ok(Vec::new());
        }

        let history: String = row.get("history");
        serde_json::from_str(&history).map_err(CoreError::storage)
    }

    /// Appends one turn, trims to the newest `max_turns`, and writes the
    /// whole history back with a refreshed expiry.
    pub async fn append(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), CoreError> {
        let mut history = self.get(session_id).await?;
        history.push(ConversationTurn {
            role,
            content: content.to_string(),
        });

        if history.len() > self.max_turns {
            history = history.split_off(history.len() - self.max_turns);
        }

        let blob = serde_json::to_string(&history).map_err(CoreError::storage)?;
        let expires_at = (Utc::now() + self.ttl).to_rfc3339();

        sqlx::query(
            "INSERT OR REPLACE INTO conversations (session_id, history, expires_at)
             VALUES (?1, ?2, ?3)",
        )
        .bind(session_id)
        .bind(&blob)
        .bind(&expires_at)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;

        Ok(())
    }

    /// Deletes a session's history. Idempotent if the session is absent.
    pub async fn clear(&self, session_id: &str) -> Result<(), CoreError> {
        sqlx::query("DELETE FROM conversations WHERE session_id = ?1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store(cfg: MemorySettings) -> ConversationStore {
        let tmp = std::env::temp_dir().join(format!("docent-memory-test-{}.db", uuid::Uuid::new_v4()));
        ConversationStore::with_path(tmp, &cfg).await.unwrap()
    }

    #[tokio::test]
    async fn append_is_monotonic_and_capped() {
        let store = test_store(MemorySettings {
            max_exchanges: 2,
            ttl_secs: 3600,
        })
        .await;

        for i in 0..5 {
            store
                .append("s1", Role::User, &format!("question {i}"))
                .await
                .unwrap();
            store
                .append("s1", Role::Assistant, &format!("answer {i}"))
                .await
                .unwrap();
        }

        let history = store.get("s1").await.unwrap();
        // Cap is 2 exchanges = 4 turns, newest kept.
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].content, "question 3");
        assert_eq!(history[3].content, "answer 4");
        assert_eq!(history[3].role, Role::Assistant);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = test_store(MemorySettings::default()).await;

        store.append("a", Role::User, "hello from a").await.unwrap();
        store.append("b", Role::User, "hello from b").await.unwrap();

        let a = store.get("a").await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].content, "hello from a");
    }

    #[tokio::test]
    async fn clear_then_get_is_empty() {
        let store = test_store(MemorySettings::default()).await;

        store.append("s1", Role::User, "hello").await.unwrap();
        store.clear("s1").await.unwrap();
        assert!(store.get("s1").await.unwrap().is_empty());

        // Clearing an absent session is fine.
        store.clear("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn expired_session_reads_as_empty() {
        let store = test_store(MemorySettings {
            max_exchanges: 10,
            ttl_secs: 0,
        })
        .await;

        store.append("s1", Role::User, "hello").await.unwrap();
        assert!(store.get("s1").await.unwrap().is_empty());
    }

    #[test]
    fn turn_json_shape() {
        let turn = ConversationTurn {
            role: Role::Assistant,
            content: "hi".to_string(),
        };
        let json = serde_json::to_string(&turn).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
