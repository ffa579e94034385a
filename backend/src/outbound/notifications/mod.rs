//! Queued, best-effort notification delivery.
//!
//! [`QueuedNotifier`] implements the domain [`Notifier`] port by pushing onto
//! a bounded Tokio channel and returning immediately. A single worker task
//! drains the channel into a [`NotificationSink`]. When the queue is full or
//! the worker has gone away the notification is rejected, and the caller
//! logs and drops it.

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::ports::{Notification, Notifier, NotifierError};

/// Default number of notifications buffered ahead of the worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Final delivery step run by the worker task.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    /// Deliver one notification.
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifierError>;
}

/// Sink that writes notifications to the structured log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifierError> {
        info!(
            kind = %notification.kind,
            recipient = %notification.recipient,
            subject = %notification.subject,
            trace_id = ?notification.trace_id.map(|id| id.to_string()),
            "notification delivered"
        );
        Ok(())
    }
}

/// Sending half of the notification queue.
#[derive(Debug, Clone)]
pub struct QueuedNotifier {
    sender: mpsc::Sender<Notification>,
}

impl QueuedNotifier {
    /// Create a queue without a worker; the caller drains the receiver.
    ///
    /// A zero capacity is raised to one.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Create a queue and spawn its worker on the current runtime.
    ///
    /// The worker stops once every clone of the notifier is dropped and the
    /// backlog has been delivered.
    pub fn spawn<S: NotificationSink>(capacity: usize, sink: S) -> (Self, JoinHandle<()>) {
        let (notifier, receiver) = Self::bounded(capacity);
        let worker = tokio::spawn(drain(receiver, sink));
        (notifier, worker)
    }
}

impl Notifier for QueuedNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifierError> {
        self.sender.try_send(notification).map_err(|error| match error {
            TrySendError::Full(_) => NotifierError::QueueFull,
            TrySendError::Closed(_) => NotifierError::Closed,
        })
    }
}

/// Deliver queued notifications until the channel closes.
pub async fn drain<S: NotificationSink>(mut receiver: mpsc::Receiver<Notification>, sink: S) {
    while let Some(notification) = receiver.recv().await {
        if let Err(error) = sink.deliver(&notification).await {
            warn!(
                kind = %notification.kind,
                recipient = %notification.recipient,
                error = %error,
                "notification delivery failed"
            );
        }
    }
    info!("notification worker stopped");
}
