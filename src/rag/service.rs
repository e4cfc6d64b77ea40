//! Conversation-facing boundary.
//!
//! What a transport layer calls: one entry point per inbound message plus
//! history read/clear. Booking detection runs after the RAG turn on the
//! raw user message only; a detection failure is logged and reported as
//! "no booking" rather than failing a turn that already produced a reply.

use crate::booking::{BookingExtractor, BookingOutcome};
use crate::core::errors::CoreError;
use crate::memory::{ConversationStore, ConversationTurn};

use super::engine::RagEngine;

/// Reply to one user message.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub reply: String,
    pub booking_detected: bool,
}

pub struct ConversationService {
    engine: RagEngine,
    extractor: BookingExtractor,
    memory: ConversationStore,
}

impl ConversationService {
    pub fn new(
        engine: RagEngine,
        extractor: BookingExtractor,
        memory: ConversationStore,
    ) -> Self {
        Self {
            engine,
            extractor,
            memory,
        }
    }

    pub async fn handle_message(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<ChatOutcome, CoreError> {
        let reply = self.engine.chat(session_id, message).await?;

        let booking_detected = match self.extractor.detect(session_id, message).await {
            Ok(BookingOutcome::Candidate(_)) => true,
            Ok(BookingOutcome::Absent) => false,
            Err(err) => {
                tracing::warn!(session_id, error = %err, "booking detection failed");
                false
            }
        };

        Ok(ChatOutcome {
            reply,
            booking_detected,
        })
    }

    pub async fn history(&self, session_id: &str) -> Result<Vec<ConversationTurn>, CoreError> {
        self.memory.get(session_id).await
    }

    pub async fn clear_history(&self, session_id: &str) -> Result<(), CoreError> {
        self.memory.clear(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::MemorySettings;
    use crate::core::errors::CoreError;
    use crate::embedding::Embedder;
    use crate::index::{IndexedVector, RetrievedMatch, VectorIndex};
    use crate::llm::{ChatRequest, LlmProvider};
    use crate::memory::Role;
    use crate::metadata::MetadataStore;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct StaticEmbedder;

    #[async_trait]
    impl Embedder for StaticEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CoreError> {
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }

        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, CoreError> {
            Ok(vec![1.0])
        }

        fn dimension(&self) -> usize {
            1
        }
    }

    struct EmptyIndex;

    #[async_trait]
    impl VectorIndex for EmptyIndex {
        async fn upsert(&self, _vectors: Vec<IndexedVector>) -> Result<(), CoreError> {
            Ok(())
        }

        async fn query(
            &self,
            _embedding: &[f32],
            _top_k: usize,
        ) -> Result<Vec<RetrievedMatch>, CoreError> {
            Ok(vec![])
        }
    }

    /// Replies with the queued responses in order: the RAG turn consumes
    /// the first, booking detection the second.
    struct QueuedLlm {
        replies: Mutex<VecDeque<Result<String, String>>>,
    }

    impl QueuedLlm {
        fn new(replies: Vec<Result<&str, &str>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for QueuedLlm {
        fn name(&self) -> &str {
            "queued"
        }

        async fn chat(&self, _request: ChatRequest) -> Result<String, CoreError> {
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(err)) => Err(CoreError::Generation(err)),
                None => Err(CoreError::Generation("no scripted reply left".to_string())),
            }
        }
    }

    async fn service_with_llm(llm: Arc<dyn LlmProvider>) -> ConversationService {
        let memory_path =
            std::env::temp_dir().join(format!("docent-svc-mem-{}.db", uuid::Uuid::new_v4()));
        let meta_path =
            std::env::temp_dir().join(format!("docent-svc-meta-{}.db", uuid::Uuid::new_v4()));

        let memory = ConversationStore::with_path(memory_path, &MemorySettings::default())
            .await
            .unwrap();
        let metadata = MetadataStore::with_path(meta_path).await.unwrap();

        let engine = RagEngine::new(
            Arc::new(StaticEmbedder),
            Arc::new(EmptyIndex),
            memory.clone(),
            llm.clone(),
            5,
            0.3,
        );
        let extractor = BookingExtractor::new(llm, metadata);

        ConversationService::new(engine, extractor, memory)
    }

    #[tokio::test]
    async fn message_with_booking_returns_reply_and_flag() {
        let llm = Arc::new(QueuedLlm::new(vec![
            Ok("You're booked in, John."),
            Ok(r#"{"name": "John", "email": "john@x.com", "date": "2025-03-15", "time": "10:00"}"#),
        ]));
        let service = service_with_llm(llm).await;

        let outcome = service
            .handle_message("s1", "Book me for 2025-03-15 at 10:00, I'm John, john@x.com")
            .await
            .unwrap();

        assert_eq!(outcome.reply, "You're booked in, John.");
        assert!(outcome.booking_detected);

        let history = service.history("s1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn plain_question_reports_no_booking() {
        let llm = Arc::new(QueuedLlm::new(vec![
            Ok("It'll be sunny."),
            Ok(r#"{"booking": false}"#),
        ]));
        let service = service_with_llm(llm).await;

        let outcome = service
            .handle_message("s1", "What's the weather?")
            .await
            .unwrap();
        assert!(!outcome.booking_detected);
    }

    #[tokio::test]
    async fn booking_failure_does_not_fail_the_turn() {
        let llm = Arc::new(QueuedLlm::new(vec![
            Ok("Here's your answer."),
            Err("model unavailable"),
        ]));
        let service = service_with_llm(llm).await;

        let outcome = service.handle_message("s1", "hello").await.unwrap();
        assert_eq!(outcome.reply, "Here's your answer.");
        assert!(!outcome.booking_detected);
    }

    #[tokio::test]
    async fn failed_generation_surfaces_and_saves_nothing() {
        let llm = Arc::new(QueuedLlm::new(vec![Err("quota exhausted")]));
        let service = service_with_llm(llm).await;

        let err = service.handle_message("s1", "hello").await.unwrap_err();
        assert!(matches!(err, CoreError::Generation(_)));
        assert!(service.history("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_history_removes_the_session() {
        let llm = Arc::new(QueuedLlm::new(vec![
            Ok("reply"),
            Ok(r#"{"booking": false}"#),
        ]));
        let service = service_with_llm(llm).await;

        service.handle_message("s1", "hello").await.unwrap();
        assert_eq!(service.history("s1").await.unwrap().len(), 2);

        service.clear_history("s1").await.unwrap();
        assert!(service.history("s1").await.unwrap().is_empty());
    }
}
