//! Document ingestion + conversational RAG core with interview booking
//! detection.
//!
//! The crate is the core a transport layer sits in front of: ingestion
//! (chunk → embed → index), retrieval-augmented chat with per-session
//! memory, and best-effort extraction of booking requests from user
//! messages. Provider clients (Gemini embeddings, Pinecone, Groq) are
//! capability traits wired once in [`state::AppState`].

pub mod booking;
pub mod chunker;
pub mod core;
pub mod embedding;
pub mod index;
pub mod llm;
pub mod logging;
pub mod memory;
pub mod metadata;
pub mod rag;
pub mod state;

pub use crate::core::config::Settings;
pub use crate::core::errors::CoreError;
pub use booking::{BookingCandidate, BookingOutcome};
pub use chunker::ChunkStrategy;
pub use memory::{ConversationTurn, Role};
pub use rag::{ChatOutcome, ConversationService, IngestReceipt, IngestionService, RagEngine};
pub use state::AppState;
