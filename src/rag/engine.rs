//! RAG chat orchestration.
//!
//! One turn runs a fixed sequence: embed the query, retrieve top-k chunks,
//! load history, assemble the prompt, generate, then append both new turns.
//! A failure at any step aborts the turn; history is written only after a
//! successful reply, so no partial turn is ever saved.

use std::sync::Arc;

use crate::core::errors::CoreError;
use crate::embedding::Embedder;
use crate::index::{RetrievedMatch, VectorIndex};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::memory::{ConversationStore, ConversationTurn, Role};

const SYSTEM_INSTRUCTION: &str = "You are a helpful AI assistant. Answer using the context below.\nIf the user wants to book an interview, collect name, email, date and time.";

pub struct RagEngine {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    memory: ConversationStore,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
    temperature: f64,
}

impl RagEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        memory: ConversationStore,
        llm: Arc<dyn LlmProvider>,
        top_k: usize,
        temperature: f64,
    ) -> Self {
        Self {
            embedder,
            index,
            memory,
            llm,
            top_k,
            temperature,
        }
    }

    /// Runs one retrieval-augmented turn and returns the assistant reply.
    pub async fn chat(&self, session_id: &str, message: &str) -> Result<String, CoreError> {
        let query_embedding = self.embedder.embed_query(message).await?;
        let matches = self.index.query(&query_embedding, self.top_k).await?;
        let history = self.memory.get(session_id).await?;

        tracing::debug!(
            session_id,
            retrieved = matches.len(),
            history_turns = history.len(),
            "assembling rag prompt"
        );

        let prompt = build_prompt(&matches, &history, message);
        let request =
            ChatRequest::new(vec![ChatMessage::user(prompt)]).with_temperature(self.temperature);
        let reply = self.llm.chat(request).await?;

        // Both turns land only after a successful generation, user first.
        self.memory.append(session_id, Role::User, message).await?;
        self.memory
            .append(session_id, Role::Assistant, &reply)
            .await?;

        Ok(reply)
    }
}

/// Concatenates the fixed instruction, retrieved context (index order,
/// blank-line separated), rendered history, and the current message.
/// The history cap in the conversation store is the only bound on prompt
/// size.
fn build_prompt(
    matches: &[RetrievedMatch],
    history: &[ConversationTurn],
    message: &str,
) -> String {
    let context = matches
        .iter()
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut history_text = String::new();
    for turn in history {
        history_text.push_str(turn.role.label());
        history_text.push_str(": ");
        history_text.push_str(&turn.content);
        history_text.push('\n');
    }

    format!(
        "{SYSTEM_INSTRUCTION}\n\nContext:\n{context}\n\nConversation so far:\n{history_text}\nUser: {message}\nAssistant:"
    )
}
