//! Background processing: task queue, worker and webhook delivery

pub mod queue;
pub mod webhook;
pub mod worker;

pub use queue::{BackgroundTask, TaskQueue};
pub use webhook::{EventStatus, WebhookEvent, WebhookEventType, WebhookNotifier};
pub use worker::BackgroundWorker;
