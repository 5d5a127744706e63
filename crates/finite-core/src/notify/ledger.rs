//! "Already notified" flags keyed by event id.

use std::collections::HashSet;
use std::sync::Mutex;

/// Persistence collaborator for expiry notifications.
///
/// Flags are monotonic: once an id is marked it stays marked, so several
/// watches racing on the same id can only ever add the same fact.
pub trait NotificationLedger: Send + Sync {
    fn has_notified(&self, event_id: &str) -> bool;

    fn mark_notified(&self, event_id: &str);

    /// Mark `event_id` and report whether this call was the first to do so.
    ///
    /// The default is check-then-mark; implementations that can do it
    /// atomically should.
    fn claim(&self, event_id: &str) -> bool {
        if self.has_notified(event_id) {
            return false;
        }
        self.mark_notified(event_id);
        true
    }
}

/// Process-local ledger.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    notified: Mutex<HashSet<String>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationLedger for MemoryLedger {
    fn has_notified(&self, event_id: &str) -> bool {
        self.notified
            .lock()
            .map(|set| set.contains(event_id))
            .unwrap_or(false)
    }

    fn mark_notified(&self, event_id: &str) {
        if let Ok(mut set) = self.notified.lock() {
            set.insert(event_id.to_string());
        }
    }

    fn claim(&self, event_id: &str) -> bool {
        self.notified
            .lock()
            .map(|mut set| set.insert(event_id.to_string()))
            .unwrap_or(false)
    }
}
