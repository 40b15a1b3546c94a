//! Bounded, fire-and-forget notification delivery
//!
//! Producers push messages with [`NotificationQueue::send`], which never
//! blocks and never fails. A single consumer task drains the queue and calls
//! the [`INotifier`]; delivery errors are logged and dropped. The consumer
//! exits once every queue handle is dropped, after draining what is left.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use scanfiler_core::domain::Tenant;
use scanfiler_core::ports::INotifier;

/// Default number of messages buffered before new ones are dropped
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug)]
struct Notification {
    tenant: String,
    recipient: String,
    html: String,
}

/// Cloneable producer handle of the notification queue
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<Notification>,
}

impl NotificationQueue {
    /// Creates the queue and spawns its consumer task
    pub fn spawn(notifier: Arc<dyn INotifier>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Notification>(capacity.max(1));
        let handle = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                match notifier.notify(&msg.recipient, &msg.html).await {
                    Ok(()) => debug!(tenant = %msg.tenant, "Notification delivered"),
                    Err(e) => warn!(
                        tenant = %msg.tenant,
                        error = format!("{e:#}"),
                        "Notification failed"
                    ),
                }
            }
            debug!("Notification queue closed");
        });
        (Self { tx }, handle)
    }

    /// Queues `html` for `tenant`
    ///
    /// Tenants without a notification identity are skipped. When the queue
    /// is full the message is dropped.
    pub fn send(&self, tenant: &Tenant, html: String) {
        let Some(recipient) = tenant.notify_identity() else {
            debug!(tenant = %tenant.name(), "No notification identity, message skipped");
            return;
        };
        let msg = Notification {
            tenant: tenant.name().to_string(),
            recipient: recipient.to_string(),
            html,
        };
        match self.tx.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(msg)) => {
                warn!(tenant = %msg.tenant, "Notification queue full, message dropped")
            }
            Err(TrySendError::Closed(msg)) => {
                warn!(tenant = %msg.tenant, "Notification queue closed, message dropped")
            }
        }
    }
}
