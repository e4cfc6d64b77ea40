//! Interview booking detection.
//!
//! Best-effort structured extraction: a language model is asked to answer
//! with either a four-field JSON object or an explicit absence marker.
//! Anything that fails to parse, or parses without all four fields,
//! resolves to "no booking" — never an error. A candidate is persisted only
//! when every field is present; partial data is dropped, not saved.

use std::sync::Arc;

use serde_json::Value;

use crate::core::errors::CoreError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::metadata::{BookingRecord, MetadataStore};

const BOOKING_PROMPT: &str = r#"Extract interview booking info from this message if present.
Message: "{message}"

If booking info is present respond ONLY with JSON:
{"name": "John", "email": "john@example.com", "date": "2025-03-15", "time": "10:00"}

If not a booking request respond ONLY with:
{"booking": false}

JSON only, no extra text."#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingCandidate {
    pub name: String,
    pub email: String,
    pub date: String,
    pub time: String,
}

/// Result of one extraction attempt. Partial records are unrepresentable:
/// a candidate always carries all four fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Absent,
    Candidate(BookingCandidate),
}

pub struct BookingExtractor {
    llm: Arc<dyn LlmProvider>,
    metadata: MetadataStore,
}

impl BookingExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>, metadata: MetadataStore) -> Self {
        Self { llm, metadata }
    }

    /// Runs extraction over one raw user message (retrieval context is
    /// deliberately not included). On a complete candidate the booking is
    /// persisted before returning. Only the model call itself can fail;
    /// every parse problem degrades to [`BookingOutcome::Absent`].
    pub async fn detect(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<BookingOutcome, CoreError> {
        let prompt = BOOKING_PROMPT.replace("{message}", message);
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]).with_temperature(0.0);

        let raw = self.llm.chat(request).await?;

        let Some(candidate) = parse_booking_reply(&raw) else {
            return Ok(BookingOutcome::Absent);
        };

        self.metadata
            .save_booking(&BookingRecord {
                session_id: session_id.to_string(),
                name: candidate.name.clone(),
                email: candidate.email.clone(),
                date: candidate.date.clone(),
                time: candidate.time.clone(),
            })
            .await?;

        tracing::info!(session_id, "booking request detected");
        Ok(BookingOutcome::Candidate(candidate))
    }
}

/// Lenient parse of the model reply: code fences stripped, then JSON.
/// Returns `None` for the absence marker, malformed JSON, and incomplete
/// records alike.
fn parse_booking_reply(raw: &str) -> Option<BookingCandidate> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let value: Value = serde_json::from_str(cleaned.trim()).ok()?;

    if value.get("booking").and_then(Value::as_bool) == Some(false) {
        return None;
    }

    let field = |key: &str| -> Option<String> {
        value.get(key)?.as_str().map(str::to_string)
    };

    Some(BookingCandidate {
        name: field("name")?,
        email: field("email")?,
        date: field("date")?,
        time: field("time")?,
    })
}
