//! Notification collaborators.
//!
//! The engine never talks to a platform notification API directly. Hosts
//! hand it a [`Notifier`] for delivery and a [`NotificationLedger`] that
//! remembers which events were already announced.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::error::NotifyError;

mod ledger;
mod reminder;

pub use ledger::{MemoryLedger, NotificationLedger};
pub use reminder::{
    remaining_life, reminder_body, spawn_reminders, ReminderFrequency, ReminderHandle,
    ReminderSettings, RemainingLife, REMINDER_TITLE,
};

/// Delivers user-visible notifications.
pub trait Notifier: Send + Sync + 'static {
    /// Ask the host for permission. `false` means nothing will be shown.
    fn request_permission(&self) -> impl Future<Output = bool> + Send;

    fn notify(
        &self,
        title: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Request permission, then deliver. Failures are logged and swallowed.
///
/// Returns whether the notification was delivered.
pub async fn deliver<N: Notifier>(notifier: &N, title: &str, body: &str) -> bool {
    if !notifier.request_permission().await {
        tracing::warn!(title, "notification permission denied");
        return false;
    }
    match notifier.notify(title, body).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(title, error = %e, "notification delivery failed");
            false
        }
    }
}

/// Spawn [`deliver`] on the current tokio runtime without waiting for it.
///
/// Outside a runtime the notification is dropped with a warning and `None`
/// is returned.
pub fn dispatch<N: Notifier>(
    notifier: Arc<N>,
    title: String,
    body: String,
) -> Option<JoinHandle<bool>> {
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => Some(runtime.spawn(async move { deliver(&*notifier, &title, &body).await })),
        Err(_) => {
            tracing::warn!(title = %title, "no async runtime, notification dropped");
            None
        }
    }
}

/// Deliveries started by [`dispatch`] that a host may want to wait for
/// before shutting its runtime down. Clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct PendingDeliveries {
    handles: Arc<Mutex<Vec<JoinHandle<bool>>>>,
}

impl PendingDeliveries {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn track(&self, handle: JoinHandle<bool>) {
        if let Ok(mut handles) = self.handles.lock() {
            handles.retain(|h| !h.is_finished());
            handles.push(handle);
        }
    }

    /// Number of deliveries that have not finished yet.
    pub fn len(&self) -> usize {
        self.handles
            .lock()
            .map(|handles| handles.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for every delivery tracked so far. Returns how many succeeded.
    pub async fn settle(&self) -> usize {
        let handles = match self.handles.lock() {
            Ok(mut handles) => std::mem::take(&mut *handles),
            Err(_) => return 0,
        };
        let mut delivered = 0;
        for handle in handles {
            if matches!(handle.await, Ok(true)) {
                delivered += 1;
            }
        }
        delivered
    }
}
