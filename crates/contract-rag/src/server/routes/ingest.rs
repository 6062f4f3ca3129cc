//! Document ingestion endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::IngestResponse;

/// POST /ingest - Upload one or more PDF files
pub async fn ingest_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("Failed to read multipart field: {}", e)))?
    {
        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidInput(format!("Failed to read {}: {}", filename, e)))?;

        tracing::debug!("Received upload '{}' ({} bytes)", filename, data.len());
        files.push((filename, data));
    }

    if files.is_empty() {
        return Err(Error::InvalidInput("No files provided".to_string()));
    }

    let report = state.pipeline().ingest_batch(files).await;

    let message = if report.errors.is_empty() {
        format!("Successfully ingested {} document(s)", report.document_ids.len())
    } else {
        format!(
            "Ingested {} document(s), {} failed",
            report.document_ids.len(),
            report.errors.len()
        )
    };

    Ok(Json(IngestResponse {
        document_ids: report.document_ids,
        errors: report.errors,
        message,
    }))
}
