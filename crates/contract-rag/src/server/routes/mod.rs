//! API routes for the contract intelligence server

pub mod ask;
pub mod audit;
pub mod extract;
pub mod ingest;
pub mod webhook;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Ingestion - with larger body limit for file uploads
        .route(
            "/ingest",
            post(ingest::ingest_files).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/extract", post(extract::extract_fields))
        .route("/audit", post(audit::audit_document))
        .route("/ask", post(ask::ask_question))
        .route("/ask/stream", get(ask::ask_question_stream))
        .route("/webhook/events", post(webhook::receive_event))
}
