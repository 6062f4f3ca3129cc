//! Outbound webhook notifications

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::WebhookConfig;
use crate::error::{Error, Result};

/// Lifecycle events reported to the webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    IngestComplete,
    ExtractComplete,
    AuditComplete,
}

/// Outcome carried by an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Success,
    Error,
}

/// Webhook payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event_type: WebhookEventType,
    /// Document id, or the filename when ingestion failed before an id existed
    pub document_id: String,
    pub status: EventStatus,
    #[serde(default)]
    pub message: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl WebhookEvent {
    pub fn success(
        event_type: WebhookEventType,
        document_id: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            document_id: document_id.to_string(),
            status: EventStatus::Success,
            message: Some(message.into()),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error(
        event_type: WebhookEventType,
        document_id: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status: EventStatus::Error,
            ..Self::success(event_type, document_id, message)
        }
    }
}

/// Posts events to the configured URL; a no-op when none is configured
#[derive(Clone)]
pub struct WebhookNotifier {
    target: Option<(Client, String)>,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        let target = match &config.url {
            Some(url) => {
                let client = Client::builder()
                    .timeout(Duration::from_secs(config.timeout_secs))
                    .build()?;
                tracing::info!("Webhook notifications enabled: {}", url);
                Some((client, url.clone()))
            }
            None => None,
        };
        Ok(Self { target })
    }

    /// Notifier that never sends anything
    pub fn disabled() -> Self {
        Self { target: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Deliver one event
    pub async fn notify(&self, event: &WebhookEvent) -> Result<()> {
        let Some((client, url)) = &self.target else {
            return Ok(());
        };

        let response = client.post(url).json(event).send().await?;
        if !response.status().is_success() {
            return Err(Error::internal(format!(
                "Webhook {} answered HTTP {}",
                url,
                response.status()
            )));
        }

        tracing::debug!(
            "Delivered {:?} webhook for {}",
            event.event_type,
            event.document_id
        );
        Ok(())
    }
}
