//! HTTP server for the contract intelligence service

pub mod routes;
pub mod state;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use state::AppState;

/// Contract RAG HTTP server
pub struct RagServer {
    config: RagConfig,
    state: AppState,
}

impl RagServer {
    /// Create a server with Ollama-backed state
    pub async fn new(config: RagConfig) -> Result<Self> {
        let state = AppState::new(config.clone()).await?;
        Ok(Self { config, state })
    }

    /// Create a server around existing state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config().clone(),
            state,
        }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/", get(info))
            .route("/healthz", get(health_check))
            .merge(routes::api_routes(self.config.server.max_upload_size))
            .with_state(self.state.clone())
            // Middleware layers (applied bottom to top)
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new());

        if self.config.server.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router.layer(cors)
        } else {
            router
        }
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();

        tracing::info!("Starting contract-rag server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// GET /healthz
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "contract-rag"
    }))
}

/// GET / - service info
async fn info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "contract-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Contract intelligence: PDF ingestion, field extraction, risk audit and cited answers",
        "llm": state.llm().map(|llm| llm.model().to_string()),
        "endpoints": {
            "POST /ingest": "Upload one or more PDF contracts (multipart)",
            "POST /extract": "Extract structured fields from a document",
            "POST /ask": "Ask a question, answer with citations",
            "GET /ask/stream": "Stream an answer as server-sent events",
            "POST /audit": "Audit a document for risky clauses",
            "POST /webhook/events": "Webhook receiver for testing",
            "GET /healthz": "Health check"
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::providers::{ChunkMetadata, IndexEntry, LlmProvider, LocalVectorIndex, VectorIndex};
    use crate::retrieval::testing::KeywordEmbedder;
    use crate::types::Document;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_state(dir: &tempfile::TempDir, llm: Option<Arc<dyn LlmProvider>>) -> AppState {
        let config = RagConfig {
            storage: StorageConfig {
                upload_dir: dir.path().join("uploads"),
                data_dir: dir.path().join("data"),
            },
            ..RagConfig::default()
        };
        AppState::with_providers(
            config,
            Arc::new(KeywordEmbedder { fail: false }),
            Arc::new(LocalVectorIndex::in_memory()),
            llm,
        )
        .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let dir = tempfile::tempdir().unwrap();
        let router = RagServer::with_state(test_state(&dir, None)).build_router();

        let response = router
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], json!("healthy"));
    }

    #[tokio::test]
    async fn test_ask_with_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let router = RagServer::with_state(test_state(&dir, None)).build_router();

        let response = router
            .oneshot(post_json("/ask", json!({"question": "Who pays?"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body["answer"],
            json!("No relevant information found in the uploaded documents.")
        );
        assert_eq!(body["citations"], json!([]));
    }

    #[tokio::test]
    async fn test_unknown_document_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let router = RagServer::with_state(test_state(&dir, None)).build_router();

        let response = router
            .oneshot(post_json("/audit", json!({"document_id": Uuid::new_v4()})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["type"], json!("not_found"));
    }

    #[tokio::test]
    async fn test_extract_and_audit_stored_document() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, None);
        let id = Uuid::new_v4();
        state
            .store()
            .put(Document::from_pages(
                id,
                "contract.pdf",
                vec![
                    "Alice agrees to pay Bob $100.".into(),
                    "This agreement auto-renews every year with 10 days notice.".into(),
                ],
            ))
            .await
            .unwrap();
        let router = RagServer::with_state(state).build_router();

        let response = router
            .clone()
            .oneshot(post_json("/extract", json!({"document_id": id})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["auto_renewal"], json!(true));
        assert_eq!(body["fallback_used"], json!(true));

        let response = router
            .oneshot(post_json("/audit", json!({"document_id": id})))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["findings"][0]["category"], json!("auto_renewal"));
        assert_eq!(body["findings"][0]["severity"], json!("high"));
    }

    #[tokio::test]
    async fn test_stream_empty_index_single_event() {
        let dir = tempfile::tempdir().unwrap();
        let router = RagServer::with_state(test_state(&dir, None)).build_router();

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/ask/stream?question=Who%20pays%3F")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(text.trim(), "data: No relevant information found.");
    }

    async fn stream_body(router: Router, uri: &str) -> String {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_stream_malformed_filter_matches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, None);
        state
            .index()
            .upsert(vec![IndexEntry {
                id: "other_page1_chunk0".into(),
                vector: vec![1.0, 0.0, 0.0, 0.0],
                text: "Alice agrees to pay Bob $100.".into(),
                metadata: ChunkMetadata {
                    document_id: Uuid::new_v4(),
                    page: 1,
                    char_start: 0,
                    char_end: 29,
                },
            }])
            .await
            .unwrap();
        let router = RagServer::with_state(state).build_router();

        let unfiltered = stream_body(router.clone(), "/ask/stream?question=pay").await;
        assert_eq!(unfiltered.trim(), "data: LLM service not configured.");

        let filtered =
            stream_body(router, "/ask/stream?question=pay&document_ids=not-a-uuid").await;
        assert_eq!(filtered.trim(), "data: No relevant information found.");
    }

    #[tokio::test]
    async fn test_webhook_receiver_echoes_event() {
        let dir = tempfile::tempdir().unwrap();
        let router = RagServer::with_state(test_state(&dir, None)).build_router();

        let response = router
            .oneshot(post_json(
                "/webhook/events",
                json!({
                    "event_type": "ingest_complete",
                    "document_id": "abc",
                    "status": "success",
                    "timestamp": "2024-01-01T00:00:00Z"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], json!("received"));
        assert_eq!(body["event_type"], json!("ingest_complete"));
    }
}
