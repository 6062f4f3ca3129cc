//! Configuration for the contract intelligence service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Upload and metadata directories
    pub storage: StorageConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Ollama/LLM configuration
    pub llm: LlmConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Webhook configuration
    pub webhook: WebhookConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file. Missing sections use defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Load from `CONTRACT_RAG_CONFIG` (if set) and apply environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("CONTRACT_RAG_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides on top of the current values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(host) = env_string("CONTRACT_RAG_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parse::<u16>("CONTRACT_RAG_PORT")? {
            self.server.port = port;
        }
        if let Some(dir) = env_string("CONTRACT_RAG_UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env_string("CONTRACT_RAG_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(size) = env_parse::<usize>("CONTRACT_RAG_CHUNK_SIZE")? {
            self.chunking.chunk_size = size;
        }
        if let Some(overlap) = env_parse::<usize>("CONTRACT_RAG_CHUNK_OVERLAP")? {
            self.chunking.chunk_overlap = overlap;
        }
        if let Some(url) = env_string("OLLAMA_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = env_string("CONTRACT_RAG_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(model) = env_string("CONTRACT_RAG_EMBED_MODEL") {
            self.embeddings.model = model;
        }
        if let Some(enabled) = env_parse::<bool>("CONTRACT_RAG_LLM_ENABLED")? {
            self.llm.enabled = enabled;
        }
        if let Some(url) = env_string("WEBHOOK_URL") {
            self.webhook.url = Some(url);
        }
        Ok(())
    }

    /// Validate all sections
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", key, e))),
        None => Ok(None),
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Local filesystem storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Raw uploaded PDFs, one file per document id
    pub upload_dir: PathBuf,
    /// Derived per-document metadata and the vector index
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("contract-rag");

        Self {
            upload_dir: base.join("uploads"),
            data_dir: base.join("data"),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive windows in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingConfig {
    /// Stride must be at least one character
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Distance between consecutive window starts
    pub fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama embedding model
    pub model: String,
    /// Embedding dimensions (768 for nomic-embed-text)
    pub dimensions: usize,
    /// Texts per embedding batch
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            batch_size: 32,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// When false the service runs on deterministic fallbacks only
    pub enabled: bool,
    /// Ollama base URL (also used for embeddings)
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// Temperature for extraction, audit and answers
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// Contract text sent to the LLM is truncated to this many characters
    pub max_prompt_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.1:8b".to_string(),
            temperature: 0.1,
            timeout_secs: 120,
            max_retries: 2,
            max_prompt_chars: 8000,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Nearest neighbours per question
    pub top_k: usize,
    /// Citation preview length in characters
    pub preview_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            preview_chars: 200,
        }
    }
}

/// Webhook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Target URL; no events are sent when unset
    pub url: Option<String>,
    /// Delivery timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 10,
        }
    }
}
