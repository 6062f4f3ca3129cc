//! Application state for the contract intelligence server

use std::sync::Arc;

use crate::analysis::{AuditEngine, ContractAnalyzer, FieldExtractor};
use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::{OllamaClient, PromptBuilder, QuestionAnswerer};
use crate::ingestion::{IngestPipeline, TextChunker};
use crate::processing::{BackgroundWorker, TaskQueue, WebhookEvent, WebhookNotifier};
use crate::providers::{
    EmbeddingProvider, LlmProvider, LocalVectorIndex, OllamaEmbedder, OllamaLlm, VectorIndex,
};
use crate::retrieval::{ContextAssembler, Indexer, Retriever};
use crate::storage::LocalDocumentStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Raw uploads and extracted documents
    store: Arc<LocalDocumentStore>,
    /// Vector index (for stats)
    index: Arc<dyn VectorIndex>,
    /// LLM provider; `None` when disabled
    llm: Option<Arc<dyn LlmProvider>>,
    /// Upload → extract → enqueue indexing
    pipeline: IngestPipeline,
    /// Field extraction and audit
    analyzer: ContractAnalyzer,
    /// Cited question answering
    answerer: QuestionAnswerer,
    /// Background task submission
    tasks: TaskQueue,
}

impl AppState {
    /// Create state with Ollama providers and the persisted local index
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing contract-rag application state...");

        let ollama = Arc::new(OllamaClient::new(&config.llm)?);
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OllamaEmbedder::from_client(
            Arc::clone(&ollama),
            &config.embeddings,
        ));
        tracing::info!(
            "Embeddings: {} ({} dimensions) at {}",
            config.embeddings.model,
            config.embeddings.dimensions,
            config.llm.base_url
        );

        let llm: Option<Arc<dyn LlmProvider>> = if config.llm.enabled {
            tracing::info!("LLM: {} at {}", config.llm.model, config.llm.base_url);
            Some(Arc::new(OllamaLlm::from_client(ollama, &config.llm)))
        } else {
            tracing::warn!("LLM disabled, extraction and audit use rule-based fallbacks only");
            None
        };

        std::fs::create_dir_all(&config.storage.data_dir)?;
        let index: Arc<dyn VectorIndex> = Arc::new(LocalVectorIndex::open(&config.storage.data_dir)?);
        tracing::info!("Vector index ready ({} vectors)", index.len().await?);

        Self::with_providers(config, embedder, index, llm)
    }

    /// Create state from explicit providers and start the background worker
    pub fn with_providers(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(LocalDocumentStore::new(&config.storage)?);
        let chunker = TextChunker::from_config(&config.chunking)?;
        let prompts = PromptBuilder::new(config.llm.max_prompt_chars);
        let temperature = config.llm.temperature;

        let indexer = Arc::new(Indexer::new(
            Arc::clone(&embedder),
            Arc::clone(&index),
            config.embeddings.batch_size,
        ));
        let retriever = Arc::new(Retriever::new(embedder, Arc::clone(&index)));

        let (tasks, receiver) = TaskQueue::new();
        let worker = BackgroundWorker::new(
            Arc::clone(&store),
            chunker,
            indexer,
            WebhookNotifier::new(&config.webhook)?,
        );
        tokio::spawn(async move {
            worker.run(receiver).await;
        });

        let pipeline = IngestPipeline::new(Arc::clone(&store), tasks.clone());
        let analyzer = ContractAnalyzer::new(
            Arc::clone(&store),
            FieldExtractor::new(llm.clone(), prompts, temperature),
            AuditEngine::new(llm.clone(), prompts, temperature),
        );
        let answerer = QuestionAnswerer::new(
            retriever,
            ContextAssembler::new(config.retrieval.preview_chars),
            prompts,
            llm.clone(),
            config.retrieval.top_k,
            temperature,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                index,
                llm,
                pipeline,
                analyzer,
                answerer,
                tasks,
            }),
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<LocalDocumentStore> {
        &self.inner.store
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.inner.index
    }

    pub fn llm(&self) -> Option<&Arc<dyn LlmProvider>> {
        self.inner.llm.as_ref()
    }

    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    pub fn analyzer(&self) -> &ContractAnalyzer {
        &self.inner.analyzer
    }

    pub fn answerer(&self) -> &QuestionAnswerer {
        &self.inner.answerer
    }

    /// Queue a webhook event; returns immediately
    pub fn notify(&self, event: WebhookEvent) {
        self.inner.tasks.notify(event);
    }
}
