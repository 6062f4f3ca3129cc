//! Risk audit endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::processing::{WebhookEvent, WebhookEventType};
use crate::server::state::AppState;
use crate::types::{AuditResponse, DocumentRequest};

/// POST /audit - Risk findings for a stored document
pub async fn audit_document(
    State(state): State<AppState>,
    Json(request): Json<DocumentRequest>,
) -> Result<Json<AuditResponse>> {
    let document_id = request.document_id;

    let report = match state.analyzer().audit(document_id).await {
        Ok(report) => report,
        Err(e) => {
            state.notify(WebhookEvent::error(
                WebhookEventType::AuditComplete,
                document_id,
                e.to_string(),
            ));
            return Err(e);
        }
    };

    state.notify(WebhookEvent::success(
        WebhookEventType::AuditComplete,
        document_id,
        format!("Audit completed with {} findings", report.findings.len()),
    ));

    Ok(Json(AuditResponse {
        document_id,
        findings: report.findings,
    }))
}
