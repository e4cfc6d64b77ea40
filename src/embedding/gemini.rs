use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::Embedder;
use crate::core::errors::CoreError;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const TASK_DOCUMENT: &str = "RETRIEVAL_DOCUMENT";
const TASK_QUERY: &str = "RETRIEVAL_QUERY";

/// Gemini `embedContent` client.
///
/// Documents and queries go through the same model with different task
/// types, matching how the index side and the query side of retrieval are
/// expected to line up.
#[derive(Clone)]
pub struct GeminiEmbedder {
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
    client: Client,
}

impl GeminiEmbedder {
    pub fn new(api_key: String, model: String, dimension: usize) -> Self {
        Self::with_base_url(GEMINI_BASE_URL.to_string(), api_key, model, dimension)
    }

    pub fn with_base_url(
        base_url: String,
        api_key: String,
        model: String,
        dimension: usize,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            dimension,
            client: Client::new(),
        }
    }

    async fn embed_one(&self, text: &str, task_type: &str) -> Result<Vec<f32>, CoreError> {
        let url = format!("{}/models/{}:embedContent", self.base_url, self.model);

        let body = json!({
            "content": { "parts": [ { "text": text } ] },
            "taskType": task_type,
        });

        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(CoreError::embedding)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(CoreError::Embedding(format!(
                "gemini embed error ({status}): {text}"
            )));
        }

        let payload: Value = res.json().await.map_err(CoreError::embedding)?;

        let values = payload["embedding"]["values"]
            .as_array()
            .ok_or_else(|| {
                CoreError::Embedding("gemini response missing embedding values".to_string())
            })?;

        let embedding: Vec<f32> = values
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();

        if embedding.len() != self.dimension {
            return Err(CoreError::Embedding(format!(
                "expected {}-dimension embedding, got {}",
                self.dimension,
                embedding.len()
            )));
        }

        Ok(embedding)
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CoreError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_one(text, TASK_DOCUMENT).await?);
        }
        Ok(embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, CoreError> {
        self.embed_one(text, TASK_QUERY).await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
