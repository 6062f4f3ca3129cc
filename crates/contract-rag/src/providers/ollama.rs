//! Ollama-based providers for embeddings and the LLM
//!
//! Both wrap a shared `OllamaClient`.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};
use crate::generation::OllamaClient;

use super::embedding::EmbeddingProvider;
use super::llm::{CompletionOptions, LlmProvider, TextStream};

/// Ollama embedding provider using nomic-embed-text or similar models
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    dimensions: usize,
    model: String,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(llm: &LlmConfig, embeddings: &EmbeddingConfig) -> Result<Self> {
        Ok(Self::from_client(
            Arc::new(OllamaClient::new(llm)?),
            embeddings,
        ))
    }

    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, embeddings: &EmbeddingConfig) -> Self {
        Self {
            client,
            dimensions: embeddings.dimensions,
            model: embeddings.model.clone(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.client.embed(&self.model, text).await?;
        if embedding.len() != self.dimensions {
            return Err(Error::indexing(format!(
                "Model {} returned {} dimensions, expected {}",
                self.model,
                embedding.len(),
                self.dimensions
            )));
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama LLM provider for completions
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
}

impl OllamaLlm {
    /// Create a new Ollama LLM provider
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self::from_client(Arc::new(OllamaClient::new(config)?), config))
    }

    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, config: &LlmConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        options: CompletionOptions,
    ) -> Result<String> {
        self.client.generate(&self.model, system, user, options).await
    }

    async fn complete_stream(
        &self,
        system: &str,
        user: &str,
        options: CompletionOptions,
    ) -> Result<TextStream> {
        self.client
            .generate_stream(&self.model, system, user, options)
            .await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
