//! Contract RAG server binary
//!
//! Run with: cargo run -p contract-rag --bin contract-rag-server

use contract_rag::{config::RagConfig, generation::OllamaClient, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contract_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                    Contract RAG Service                   ║
║      Extraction, Risk Audit and Cited Contract Q&A        ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration (CONTRACT_RAG_CONFIG file, then env overrides)
    let config = RagConfig::from_env()?;
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Upload dir: {}", config.storage.upload_dir.display());
    tracing::info!("  - Data dir: {}", config.storage.data_dir.display());
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - LLM model: {} (enabled: {})", config.llm.model, config.llm.enabled);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    // Check Ollama
    tracing::info!("Checking Ollama at {}...", config.llm.base_url);
    if OllamaClient::new(&config.llm)?.health_check().await? {
        tracing::info!("Ollama is running");
    } else {
        tracing::warn!("Ollama not available at {}", config.llm.base_url);
        tracing::warn!("Ingestion will store documents but indexing and answers will fail until it is up:");
        tracing::warn!("  1. Start: ollama serve");
        tracing::warn!(
            "  2. Pull models: ollama pull {} && ollama pull {}",
            config.embeddings.model,
            config.llm.model
        );
    }

    // Create and start server
    let server = RagServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/healthz", server.address());
    println!("\nEndpoints:");
    println!("  POST /ingest      - Upload PDF contracts");
    println!("  POST /extract     - Extract contract fields");
    println!("  POST /audit       - Audit for risky clauses");
    println!("  POST /ask         - Ask questions with citations");
    println!("  GET  /ask/stream  - Streamed answers (SSE)");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
