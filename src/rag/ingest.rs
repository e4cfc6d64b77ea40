//! Document ingestion pipeline.
//!
//! chunk → embed → upsert → record. Input problems (empty text, unknown
//! strategy, bad parameters) are rejected before any network call, and no
//! vector is upserted unless the whole batch embedded successfully.

use std::sync::Arc;

use uuid::Uuid;

use crate::chunker::{chunk_text, ChunkStrategy};
use crate::core::config::ChunkingSettings;
use crate::core::errors::CoreError;
use crate::embedding::Embedder;
use crate::index::{vector_id, ChunkMetadata, IndexedVector, VectorIndex};
use crate::metadata::{DocumentRecord, MetadataStore};

/// What the ingestion collaborator gets back for one upload.
#[derive(Debug, Clone)]
pub struct IngestReceipt {
    pub doc_id: String,
    pub filename: String,
    pub strategy: String,
    pub chunk_count: usize,
    pub vector_ids: Vec<String>,
}

pub struct IngestionService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    metadata: MetadataStore,
    chunking: ChunkingSettings,
}

impl IngestionService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        metadata: MetadataStore,
        chunking: ChunkingSettings,
    ) -> Self {
        Self {
            embedder,
            index,
            metadata,
            chunking,
        }
    }

    /// Ingests one document's extracted text under the named strategy.
    ///
    /// Every upload gets a fresh `doc_id`, so re-uploading the same file
    /// creates a new document version rather than overwriting the old one.
    pub async fn ingest(
        &self,
        filename: &str,
        text: &str,
        strategy_name: &str,
    ) -> Result<IngestReceipt, CoreError> {
        if text.trim().is_empty() {
            return Err(CoreError::EmptyDocument);
        }

        let strategy = ChunkStrategy::from_name(strategy_name, &self.chunking)?;
        let chunks = chunk_text(text, strategy)?;

        let embeddings = self.embedder.embed_batch(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(CoreError::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let doc_id = Uuid::new_v4().to_string();

        let vectors: Vec<IndexedVector> = chunks
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (chunk, embedding))| IndexedVector {
                id: vector_id(&doc_id, i),
                embedding,
                metadata: ChunkMetadata {
                    doc_id: doc_id.clone(),
                    filename: filename.to_string(),
                    chunk_index: i,
                    text: chunk.clone(),
                    strategy: strategy.name().to_string(),
                },
            })
            .collect();

        let vector_ids: Vec<String> = vectors.iter().map(|v| v.id.clone()).collect();

        self.index.upsert(vectors).await?;

        self.metadata
            .save_document(&DocumentRecord {
                id: doc_id.clone(),
                filename: filename.to_string(),
                strategy: strategy.name().to_string(),
                chunk_count: chunks.len(),
            })
            .await?;

        tracing::info!(
            doc_id,
            filename,
            strategy = strategy.name(),
            chunks = chunks.len(),
            "document ingested"
        );

        Ok(IngestReceipt {
            doc_id,
            filename: filename.to_string(),
            strategy: strategy.name().to_string(),
            chunk_count: chunks.len(),
            vector_ids,
        })
    }
}
