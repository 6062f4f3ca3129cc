//! Webhook receiver, useful for testing delivery end to end

use axum::Json;
use serde_json::{json, Value};

use crate::processing::WebhookEvent;

/// POST /webhook/events - Acknowledge a webhook event
pub async fn receive_event(Json(event): Json<WebhookEvent>) -> Json<Value> {
    tracing::info!(
        "Received webhook {:?} ({:?}) for {}",
        event.event_type,
        event.status,
        event.document_id
    );

    Json(json!({
        "status": "received",
        "event_type": event.event_type,
        "document_id": event.document_id,
        "timestamp": event.timestamp,
    }))
}
