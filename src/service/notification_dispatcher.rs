//! Post-commit notification queue.
//!
//! Request mutations enqueue an event after the write has been stored and
//! return immediately. A single background worker turns events into stored
//! notifications through [`NotificationService`]; failures are logged and
//! never reach the caller that triggered them.

use tokio::sync::{mpsc, oneshot};

use crate::{
    models::requestmodel::RequestStatus,
    service::notification_service::{NotificationService, RequestContext},
};

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    /// A customer submitted a new request.
    Created { context: RequestContext },
    /// An existing request moved to `status`.
    StatusChanged {
        context: RequestContext,
        status: RequestStatus,
    },
}

enum DispatchMessage {
    Emit(NotificationEvent),
    /// Answered once every message queued before it has been handled.
    Flush(oneshot::Sender<()>),
}

/// Cloneable handle to the worker.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::Sender<DispatchMessage>,
}

impl NotificationDispatcher {
    /// Starts the worker on the current runtime. The queue holds at most
    /// `capacity` pending events.
    pub fn spawn(service: NotificationService, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        tokio::spawn(run_worker(service, receiver));

        Self { sender }
    }

    /// Queues an event without waiting. A full or closed queue drops the
    /// event with a warning.
    pub fn enqueue(&self, event: NotificationEvent) {
        match self.sender.try_send(DispatchMessage::Emit(event)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(DispatchMessage::Emit(event))) => {
                tracing::warn!("Notification queue full, dropping {:?}", event);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("Notification worker stopped, dropping event");
            }
            Err(mpsc::error::TrySendError::Full(_)) => {}
        }
    }

    /// Waits until everything enqueued so far has been processed.
    pub async fn flush(&self) {
        let (reply, done) = oneshot::channel();
        if self.sender.send(DispatchMessage::Flush(reply)).await.is_err() {
            return;
        }
        let _ = done.await;
    }
}

async fn run_worker(service: NotificationService, mut receiver: mpsc::Receiver<DispatchMessage>) {
    while let Some(message) = receiver.recv().await {
        match message {
            DispatchMessage::Emit(NotificationEvent::Created { context }) => {
                if let Err(e) = service.notify_request_created(&context).await {
                    tracing::error!(
                        "Failed to emit new request notification for {}: {}",
                        context.request_id,
                        e
                    );
                }
            }
            DispatchMessage::Emit(NotificationEvent::StatusChanged { context, status }) => {
                if let Err(e) = service.notify_request_status_change(&context, status).await {
                    tracing::error!(
                        "Failed to emit notification for request {} ({}): {}",
                        context.request_id,
                        status,
                        e
                    );
                }
            }
            DispatchMessage::Flush(reply) => {
                let _ = reply.send(());
            }
        }
    }

    tracing::debug!("Notification worker stopped");
}
