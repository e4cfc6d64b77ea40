//! Vector index capability.
//!
//! Stores `(id, embedding, metadata)` triples and answers top-k cosine
//! similarity queries. Two backends: a Pinecone serverless adapter and a
//! local SQLite brute-force index.

pub mod pinecone;
pub mod sqlite;

pub use pinecone::PineconeIndex;
pub use sqlite::SqliteIndex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::CoreError;

/// Metadata persisted alongside each vector. `text` is the retrieval
/// payload; the rest identifies where the chunk came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub doc_id: String,
    pub filename: String,
    pub chunk_index: usize,
    pub text: String,
    pub strategy: String,
}

#[derive(Debug, Clone)]
pub struct IndexedVector {
    pub id: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// One retrieval hit. Ephemeral, never persisted.
#[derive(Debug, Clone)]
pub struct RetrievedMatch {
    pub text: String,
    pub score: f32,
}

/// Deterministic vector id. Re-ingesting the same `doc_id` + index pair
/// overwrites instead of duplicating.
pub fn vector_id(doc_id: &str, chunk_index: usize) -> String {
    format!("{doc_id}-chunk-{chunk_index}")
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Upserts vectors; idempotent per id (a re-upserted id replaces the
    /// prior embedding and metadata).
    async fn upsert(&self, vectors: Vec<IndexedVector>) -> Result<(), CoreError>;

    /// Returns up to `top_k` matches sorted by descending similarity.
    async fn query(&self, embedding: &[f32], top_k: usize)
        -> Result<Vec<RetrievedMatch>, CoreError>;
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_id_format() {
        assert_eq!(vector_id("abc", 3), "abc-chunk-3");
    }

    #[test]
    fn cosine_basics() {
        assert!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) > 0.99);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
