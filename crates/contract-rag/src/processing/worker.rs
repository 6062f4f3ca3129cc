//! Background worker that drains the task queue

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::error::Result;
use crate::ingestion::TextChunker;
use crate::retrieval::Indexer;
use crate::storage::LocalDocumentStore;

use super::queue::BackgroundTask;
use super::webhook::WebhookNotifier;

/// Tasks allowed to run at the same time
const MAX_CONCURRENT_TASKS: usize = 4;

/// Worker for indexing documents and delivering webhooks
#[derive(Clone)]
pub struct BackgroundWorker {
    store: Arc<LocalDocumentStore>,
    chunker: TextChunker,
    indexer: Arc<Indexer>,
    notifier: WebhookNotifier,
}

impl BackgroundWorker {
    pub fn new(
        store: Arc<LocalDocumentStore>,
        chunker: TextChunker,
        indexer: Arc<Indexer>,
        notifier: WebhookNotifier,
    ) -> Self {
        Self {
            store,
            chunker,
            indexer,
            notifier,
        }
    }

    /// Process tasks until every `TaskQueue` handle is dropped, then wait for
    /// in-flight tasks
    pub async fn run(self, mut receiver: mpsc::UnboundedReceiver<BackgroundTask>) {
        tracing::info!("Background worker started ({} concurrent tasks)", MAX_CONCURRENT_TASKS);

        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_TASKS));
        let mut in_flight = JoinSet::new();

        while let Some(task) = receiver.recv().await {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let worker = self.clone();
            in_flight.spawn(async move {
                worker.handle(task).await;
                drop(permit);
            });

            while in_flight.try_join_next().is_some() {}
        }

        while in_flight.join_next().await.is_some() {}
        tracing::info!("Background worker stopped");
    }

    /// Run one task; failures are logged, never surfaced
    pub async fn handle(&self, task: BackgroundTask) {
        match task {
            BackgroundTask::Index { document_id } => {
                if let Err(e) = self.index_document(document_id).await {
                    tracing::error!("Indexing document {} failed: {}", document_id, e);
                }
            }
            BackgroundTask::Webhook(event) => {
                if let Err(e) = self.notifier.notify(&event).await {
                    tracing::warn!(
                        "Webhook {:?} for {} failed: {}",
                        event.event_type,
                        event.document_id,
                        e
                    );
                }
            }
        }
    }

    async fn index_document(&self, document_id: Uuid) -> Result<usize> {
        let document = self.store.get(document_id).await?;
        let count = self
            .indexer
            .index(&document_id, self.chunker.chunk(&document))
            .await?;
        tracing::info!("Document {} ({}) indexed: {} chunks", document_id, document.filename, count);
        Ok(count)
    }
}
