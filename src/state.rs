use std::sync::Arc;

use crate::booking::BookingExtractor;
use crate::core::config::Settings;
use crate::core::errors::CoreError;
use crate::embedding::{Embedder, GeminiEmbedder};
use crate::index::{PineconeIndex, SqliteIndex, VectorIndex};
use crate::llm::{GroqProvider, LlmProvider};
use crate::memory::ConversationStore;
use crate::metadata::MetadataStore;
use crate::rag::{ConversationService, IngestionService, RagEngine};

/// Shared application state: every external capability constructed once at
/// process start and handed around as `Arc`s. Nothing in the pipeline
/// creates its own clients.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub memory: ConversationStore,
    pub metadata: MetadataStore,
    pub embedder: Arc<dyn Embedder>,
    pub index: Arc<dyn VectorIndex>,
    pub llm: Arc<dyn LlmProvider>,
}

impl AppState {
    /// Initializes stores and provider clients from settings.
    ///
    /// The vector index backend follows the configuration: Pinecone when
    /// credentials are present, otherwise the local SQLite index.
    pub async fn initialize(settings: Settings) -> Result<Arc<Self>, CoreError> {
        std::fs::create_dir_all(&settings.data_dir).map_err(CoreError::storage)?;

        let memory =
            ConversationStore::with_path(settings.memory_db_path(), &settings.memory).await?;
        let metadata = MetadataStore::with_path(settings.metadata_db_path()).await?;

        let embedder: Arc<dyn Embedder> = Arc::new(GeminiEmbedder::new(
            settings.gemini_api_key.clone(),
            settings.models.embedding_model.clone(),
            settings.models.embedding_dimension,
        ));

        let llm: Arc<dyn LlmProvider> = Arc::new(GroqProvider::new(
            settings.groq_api_key.clone(),
            settings.models.chat_model.clone(),
        ));

        let index: Arc<dyn VectorIndex> = match &settings.pinecone {
            Some(pinecone) => Arc::new(PineconeIndex::new(
                pinecone,
                settings.models.embedding_dimension,
            )),
            None => {
                tracing::info!("pinecone not configured, using local sqlite index");
                Arc::new(SqliteIndex::with_path(settings.index_db_path()).await?)
            }
        };

        Ok(Arc::new(Self {
            settings: Arc::new(settings),
            memory,
            metadata,
            embedder,
            index,
            llm,
        }))
    }

    pub fn ingestion(&self) -> IngestionService {
        IngestionService::new(
            self.embedder.clone(),
            self.index.clone(),
            self.metadata.clone(),
            self.settings.chunking.clone(),
        )
    }

    pub fn conversation(&self) -> ConversationService {
        let engine = RagEngine::new(
            self.embedder.clone(),
            self.index.clone(),
            self.memory.clone(),
            self.llm.clone(),
            self.settings.retrieval.top_k,
            self.settings.models.chat_temperature,
        );
        let extractor = BookingExtractor::new(self.llm.clone(), self.metadata.clone());

        ConversationService::new(engine, extractor, self.memory.clone())
    }
}
