//! Embedding capability.
//!
//! One fixed-dimension vector per text, produced the same way for document
//! chunks and queries so cosine similarity between the two is meaningful.

pub mod gemini;

pub use gemini::GeminiEmbedder;

use async_trait::async_trait;

use crate::core::errors::CoreError;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds document chunks, one vector per input, order-preserving.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CoreError>;

    /// Embeds a search query. Uses the provider's query task mode so query
    /// and document vectors stay comparable.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, CoreError>;

    /// Dimension every returned vector must have. A provider response with
    /// any other length is an error, never coerced.
    fn dimension(&self) -> usize;
}
