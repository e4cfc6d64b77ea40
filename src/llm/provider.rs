use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::CoreError;

/// Chat-completion capability the orchestrator and the booking extractor
/// call into. Implementations own their transport, timeouts and retries;
/// the callers treat any error as terminal for the turn.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "groq")
    fn name(&self) -> &str;

    /// chat completion (non-streaming)
    async fn chat(&self, request: ChatRequest) -> Result<String, CoreError>;
}
