//! Fire-and-forget background task queue

use tokio::sync::mpsc;
use uuid::Uuid;

use super::webhook::WebhookEvent;

/// Work done after a request has already been answered
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundTask {
    /// Chunk and index a stored document
    Index { document_id: Uuid },
    /// Deliver a webhook event
    Webhook(WebhookEvent),
}

/// Sending side of the background queue.
///
/// Delivery is at-most-once and best-effort: tasks are lost if the worker has
/// stopped or the process exits before they run.
#[derive(Clone)]
pub struct TaskQueue {
    sender: mpsc::UnboundedSender<BackgroundTask>,
}

impl TaskQueue {
    /// Create the queue and the receiver the worker drains
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BackgroundTask>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Enqueue a task without waiting for it
    pub fn submit(&self, task: BackgroundTask) {
        if let Err(e) = self.sender.send(task) {
            tracing::warn!("Background worker stopped, dropping task: {:?}", e.0);
        }
    }

    pub fn index(&self, document_id: Uuid) {
        self.submit(BackgroundTask::Index { document_id });
    }

    pub fn notify(&self, event: WebhookEvent) {
        self.submit(BackgroundTask::Webhook(event));
    }
}
