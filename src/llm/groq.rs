use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::errors::CoreError;

const GROQ_BASE_URL: &str = "https://api.groq.com/openai";

/// Groq chat-completion client. The API is OpenAI-compatible, so the wire
/// shape is the standard `/v1/chat/completions` request/response.
#[derive(Clone)]
pub struct GroqProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl GroqProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(GROQ_BASE_URL.to_string(), api_key, model)
    }

    /// Point the client at a different OpenAI-compatible endpoint. Used by
    /// tests against a local server.
    pub fn with_base_url(base_url: String, api_key: String, model: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, CoreError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(t) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(t));
            }
        }

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(CoreError::generation)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(CoreError::Generation(format!(
                "groq chat error ({status}): {text}"
            )));
        }

        let payload: Value = res.json().await.map_err(CoreError::generation)?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                CoreError::Generation("groq response missing message content".to_string())
            })?
            .to_string();

        Ok(content)
    }
}
