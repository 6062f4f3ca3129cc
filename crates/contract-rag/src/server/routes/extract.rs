//! Field extraction endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::processing::{WebhookEvent, WebhookEventType};
use crate::server::state::AppState;
use crate::types::{DocumentRequest, ExtractResponse};

/// POST /extract - Structured fields for a stored document
pub async fn extract_fields(
    State(state): State<AppState>,
    Json(request): Json<DocumentRequest>,
) -> Result<Json<ExtractResponse>> {
    let document_id = request.document_id;

    let report = match state.analyzer().extract(document_id).await {
        Ok(report) => report,
        Err(e) => {
            state.notify(WebhookEvent::error(
                WebhookEventType::ExtractComplete,
                document_id,
                e.to_string(),
            ));
            return Err(e);
        }
    };

    state.notify(WebhookEvent::success(
        WebhookEventType::ExtractComplete,
        document_id,
        "Fields extracted successfully",
    ));

    let fallback_used = report.outcome.is_fallback();
    Ok(Json(ExtractResponse {
        document_id,
        fields: report.outcome.into_fields(),
        fallback_used,
    }))
}
