pub mod engine;
pub mod ingest;
pub mod service;

pub use engine::RagEngine;
pub use ingest::{IngestReceipt, IngestionService};
pub use service::{ChatOutcome, ConversationService};
