//! Batch ingestion: store, extract, then hand off indexing

use bytes::Bytes;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::processing::{TaskQueue, WebhookEvent, WebhookEventType};
use crate::storage::LocalDocumentStore;
use crate::types::IngestError;

/// Outcome of a batch; failures do not abort the remaining files
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub document_ids: Vec<Uuid>,
    pub errors: Vec<IngestError>,
}

/// Ingestion pipeline
pub struct IngestPipeline {
    store: Arc<LocalDocumentStore>,
    tasks: TaskQueue,
}

impl IngestPipeline {
    pub fn new(store: Arc<LocalDocumentStore>, tasks: TaskQueue) -> Self {
        Self { store, tasks }
    }

    /// Ingest every `(filename, bytes)` pair in order
    pub async fn ingest_batch(&self, files: Vec<(String, Bytes)>) -> IngestReport {
        let mut report = IngestReport::default();

        for (filename, data) in files {
            match self.ingest_file(&filename, &data).await {
                Ok(document_id) => {
                    self.tasks.index(document_id);
                    self.tasks.notify(WebhookEvent::success(
                        WebhookEventType::IngestComplete,
                        document_id,
                        format!("Document {} ingested successfully", filename),
                    ));
                    report.document_ids.push(document_id);
                }
                Err(e) => {
                    tracing::warn!("Ingestion of '{}' failed: {}", filename, e);
                    self.tasks.notify(WebhookEvent::error(
                        WebhookEventType::IngestComplete,
                        &filename,
                        e.to_string(),
                    ));
                    report.errors.push(IngestError {
                        filename,
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }

    async fn ingest_file(&self, filename: &str, data: &[u8]) -> Result<Uuid> {
        if !is_pdf_filename(filename) {
            return Err(Error::InvalidInput(format!("File {} is not a PDF", filename)));
        }
        if data.is_empty() {
            return Err(Error::InvalidInput(format!("File {} is empty", filename)));
        }

        let document_id = self.store.ingest(data, filename).await?;
        let document = match self.store.extract_text(document_id).await {
            Ok(document) => document,
            Err(e) => {
                if let Err(cleanup) = self.store.delete(document_id).await {
                    tracing::warn!(
                        "Failed to remove upload {} after extraction error: {}",
                        document_id,
                        cleanup
                    );
                }
                return Err(e);
            }
        };

        tracing::info!(
            "Ingested '{}' as {} ({} pages, {} chars)",
            filename,
            document_id,
            document.pages.len(),
            document.total_chars
        );

        Ok(document_id)
    }
}

fn is_pdf_filename(filename: &str) -> bool {
    std::path::Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
