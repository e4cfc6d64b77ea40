use thiserror::Error;

/// Error taxonomy for the RAG core.
///
/// Input errors are rejected before any network call. Upstream errors carry
/// the stage that failed so callers can report chunking vs embedding vs
/// generation vs storage failures distinctly.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown chunk strategy: {0}")]
    InvalidStrategy(String),
    #[error("invalid chunk parameters: {0}")]
    InvalidChunkParams(String),
    #[error("document has no extractable text")]
    EmptyDocument,
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("vector index error: {0}")]
    Index(String),
    #[error("generation failed: {0}")]
    Generation(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl CoreError {
    pub fn embedding<E: std::fmt::Display>(err: E) -> Self {
        CoreError::Embedding(err.to_string())
    }

    pub fn index<E: std::fmt::Display>(err: E) -> Self {
        CoreError::Index(err.to_string())
    }

    pub fn generation<E: std::fmt::Display>(err: E) -> Self {
        CoreError::Generation(err.to_string())
    }

    pub fn storage<E: std::fmt::Display>(err: E) -> Self {
        CoreError::Storage(err.to_string())
    }

    /// True for errors callers should treat as bad input rather than a
    /// failed upstream call.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidStrategy(_)
                | CoreError::InvalidChunkParams(_)
                | CoreError::EmptyDocument
        )
    }
}
