//! Pinecone serverless index adapter.
//!
//! Control-plane calls go to `api.pinecone.io`; data-plane calls go to the
//! index host resolved on first use. Index creation is a lazy one-time side
//! effect: if the configured index does not exist it is created with the
//! embedder's dimension and cosine metric.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use super::{IndexedVector, RetrievedMatch, VectorIndex};
use crate::core::config::PineconeSettings;
use crate::core::errors::CoreError;

const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";

pub struct PineconeIndex {
    control_url: String,
    api_key: String,
    index_name: String,
    cloud: String,
    region: String,
    dimension: usize,
    host: OnceCell<String>,
    client: Client,
}

impl PineconeIndex {
    pub fn new(settings: &PineconeSettings, dimension: usize) -> Self {
        Self {
            control_url: CONTROL_PLANE_URL.to_string(),
            api_key: settings.api_key.clone(),
            index_name: settings.index.clone(),
            cloud: settings.cloud.clone(),
            region: settings.region.clone(),
            dimension,
            host: OnceCell::new(),
            client: Client::new(),
        }
    }

    /// Resolves the index's data-plane host, creating the index if it does
    /// not exist yet. The host is cached for the process lifetime;
    /// concurrent first calls may both hit the control plane, and a
    /// "already exists" response from create is treated as success.
    async fn ensure_host(&self) -> Result<&str, CoreError> {
        self.host
            .get_or_try_init(|| async {
                match self.describe_index().await? {
                    Some(host) => Ok(host),
                    None => {
                        tracing::info!(index = %self.index_name, "creating pinecone index");
                        self.create_index().await
                    }
                }
            })
            .await
            .map(String::as_str)
    }

    async fn describe_index(&self) -> Result<Option<String>, CoreError> {
        let url = format!("{}/indexes/{}", self.control_url, self.index_name);
        let res = self
            .client
            .get(&url)
            .header("Api-Key", &self.api_key)
            .send()
            .await
            .map_err(CoreError::index)?;

        match res.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let payload: Value = res.json().await.map_err(CoreError::index)?;
                payload["host"]
                    .as_str()
                    .map(|h| Some(h.to_string()))
                    .ok_or_else(|| {
                        CoreError::Index("pinecone describe response missing host".to_string())
                    })
            }
            status => {
                let text = res.text().await.unwrap_or_default();
                Err(CoreError::Index(format!(
                    "pinecone describe error ({status}): {text}"
                )))
            }
        }
    }

    async fn create_index(&self) -> Result<String, CoreError> {
        let url = format!("{}/indexes", self.control_url);
        let body = json!({
            "name": self.index_name,
            "dimension": self.dimension,
            "metric": "cosine",
            "spec": {
                "serverless": { "cloud": self.cloud, "region": self.region }
            }
        });

        let res = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(CoreError::index)?;

        if res.status() == StatusCode::CONFLICT {
            // Another process (or a concurrent first call) created it.
            return self.describe_index().await?.ok_or_else(|| {
                CoreError::Index("pinecone index exists but cannot be described".to_string())
            });
        }

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(CoreError::Index(format!(
                "pinecone create error ({status}): {text}"
            )));
        }

        let payload: Value = res.json().await.map_err(CoreError::index)?;
        payload["host"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CoreError::Index("pinecone create response missing host".to_string()))
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, vectors: Vec<IndexedVector>) -> Result<(), CoreError> {
        if vectors.is_empty() {
            return Ok(());
        }

        let host = self.ensure_host().await?;
        let url = format!("https://{host}/vectors/upsert");

        let payload: Vec<Value> = vectors
            .iter()
            .map(|v| {
                json!({
                    "id": v.id,
                    "values": v.embedding,
                    "metadata": {
                        "doc_id": v.metadata.doc_id,
                        "filename": v.metadata.filename,
                        "chunk_index": v.metadata.chunk_index,
                        "text": v.metadata.text,
                        "strategy": v.metadata.strategy,
                    }
                })
            })
            .collect();

        let res = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&json!({ "vectors": payload }))
            .send()
            .await
            .map_err(CoreError::index)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(CoreError::Index(format!(
                "pinecone upsert error ({status}): {text}"
            )));
        }

        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedMatch>, CoreError> {
        let host = self.ensure_host().await?;
        let url = format!("https://{host}/query");

        let body = json!({
            "vector": embedding,
            "topK": top_k,
            "includeMetadata": true,
        });

        let res = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(CoreError::index)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(CoreError::Index(format!(
                "pinecone query error ({status}): {text}"
            )));
        }

        let payload: Value = res.json().await.map_err(CoreError::index)?;

        let mut matches = Vec::new();
        if let Some(hits) = payload["matches"].as_array() {
            for hit in hits {
                let text = hit["metadata"]["text"].as_str().unwrap_or_default();
                let score = hit["score"].as_f64().unwrap_or(0.0) as f32;
                matches.push(RetrievedMatch {
                    text: text.to_string(),
                    score,
                });
            }
        }

        Ok(matches)
    }
}
