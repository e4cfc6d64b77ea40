use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Runtime settings for the RAG core.
///
/// Loaded once at process start, either from environment variables
/// ([`Settings::from_env`]) or from a YAML file with env overrides for the
/// secrets ([`Settings::from_file`]). Passed by reference into every
/// component; nothing reads the environment after startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub gemini_api_key: String,
    pub groq_api_key: String,
    /// Remote vector index credentials. When absent the local SQLite index
    /// backend is used instead.
    #[serde(default)]
    pub pinecone: Option<PineconeSettings>,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub chunking: ChunkingSettings,
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub memory: MemorySettings,
    #[serde(default)]
    pub models: ModelSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PineconeSettings {
    pub api_key: String,
    pub index: String,
    #[serde(default = "default_cloud")]
    pub cloud: String,
    #[serde(default = "default_region")]
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkingSettings {
    pub size: usize,
    pub overlap: usize,
    pub max_sentences: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalSettings {
    pub top_k: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemorySettings {
    /// Exchanges (user + assistant pairs) kept per session.
    pub max_exchanges: usize,
    /// Session expiry, refreshed on every append.
    pub ttl_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    pub chat_model: String,
    pub chat_temperature: f64,
    pub embedding_model: String,
    pub embedding_dimension: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            size: 500,
            overlap: 50,
            max_sentences: 5,
        }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            max_exchanges: 10,
            ttl_secs: 3600,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            chat_model: "llama-3.1-8b-instant".to_string(),
            chat_temperature: 0.3,
            embedding_model: "gemini-embedding-001".to_string(),
            embedding_dimension: 3072,
        }
    }
}

fn default_data_dir() -> PathBuf {
    env::var("DOCENT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn default_cloud() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Settings {
    /// Builds settings from environment variables.
    ///
    /// `GEMINI_API_KEY` and `GROQ_API_KEY` are required. Pinecone is enabled
    /// when both `PINECONE_API_KEY` and `PINECONE_INDEX` are set.
    pub fn from_env() -> anyhow::Result<Self> {
        let gemini_api_key =
            env::var("GEMINI_API_KEY").context("GEMINI_API_KEY is not set")?;
        let groq_api_key = env::var("GROQ_API_KEY").context("GROQ_API_KEY is not set")?;

        let pinecone = match (env::var("PINECONE_API_KEY"), env::var("PINECONE_INDEX")) {
            (Ok(api_key), Ok(index)) => Some(PineconeSettings {
                api_key,
                index,
                cloud: env::var("PINECONE_CLOUD").unwrap_or_else(|_| default_cloud()),
                region: env::var("PINECONE_REGION").unwrap_or_else(|_| default_region()),
            }),
            _ => None,
        };

        Ok(Self {
            gemini_api_key,
            groq_api_key,
            pinecone,
            data_dir: default_data_dir(),
            chunking: ChunkingSettings::default(),
            retrieval: RetrievalSettings::default(),
            memory: MemorySettings::default(),
            models: ModelSettings::default(),
        })
    }

    /// Loads settings from a YAML file, then lets `GEMINI_API_KEY` /
    /// `GROQ_API_KEY` env vars override the file values so secrets can stay
    /// out of checked-in config.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut settings: Settings = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        if let Ok(key) = env::var("GEMINI_API_KEY") {
            settings.gemini_api_key = key;
        }
        if let Ok(key) = env::var("GROQ_API_KEY") {
            settings.groq_api_key = key;
        }

        Ok(settings)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn memory_db_path(&self) -> PathBuf {
        self.data_dir.join("memory.db")
    }

    pub fn metadata_db_path(&self) -> PathBuf {
        self.data_dir.join("metadata.db")
    }

    pub fn index_db_path(&self) -> PathBuf {
        self.data_dir.join("index.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_with_defaults() {
        let yaml = r#"
gemini_api_key: "g-key"
groq_api_key: "q-key"
pinecone:
  api_key: "p-key"
  index: "docs"
memory:
  max_exchanges: 4
  ttl_secs: 120
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.memory.max_exchanges, 4);
        assert_eq!(settings.chunking.size, 500);
        assert_eq!(settings.retrieval.top_k, 5);

        let pinecone = settings.pinecone.unwrap();
        assert_eq!(pinecone.index, "docs");
        assert_eq!(pinecone.cloud, "aws");
        assert_eq!(pinecone.region, "us-east-1");
    }

    #[test]
    fn model_defaults() {
        let models = ModelSettings::default();
        assert_eq!(models.chat_model, "llama-3.1-8b-instant");
        assert_eq!(models.embedding_dimension, 3072);
    }
}
