//! Per-display countdown watch: evaluates a target every tick and raises a
//! one-shot expiry notice when a bounded countdown reaches zero.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::progress::ProgressMode;
use super::target::{CountdownSnapshot, CountdownTarget};
use crate::error::SchedulerError;
use crate::notify::{dispatch, NotificationLedger, Notifier, PendingDeliveries};
use crate::timer::{Clock, TickScheduler};

/// Raised once when a watched countdown reaches its target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiryNotice {
    pub event_id: Option<String>,
    pub title: String,
    pub body: String,
    pub at: DateTime<Utc>,
}

/// Result of one observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub snapshot: CountdownSnapshot,
    pub expiry: Option<ExpiryNotice>,
}

/// Watches one [`CountdownTarget`] for the lifetime of a display.
#[derive(Debug, Clone)]
pub struct CountdownWatch {
    target: CountdownTarget,
    event_id: Option<String>,
    title: String,
    /// `Some(false)` once a positive remaining delta has been seen.
    last_expired: Option<bool>,
    notified: bool,
}

impl CountdownWatch {
    pub fn new(target: CountdownTarget, title: impl Into<String>) -> Self {
        Self {
            target,
            event_id: None,
            title: title.into(),
            last_expired: None,
            notified: false,
        }
    }

    /// Idempotency key shared with other watches on the same event.
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    pub fn target(&self) -> &CountdownTarget {
        &self.target
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    /// Only bounded countdowns that stop at zero announce expiry.
    fn notifies_on_expiry(&self) -> bool {
        !self.target.allow_negative()
            && matches!(
                self.target.mode(),
                ProgressMode::StartToTarget | ProgressMode::TargetOnly
            )
    }

    /// Evaluate the target at `now`.
    ///
    /// An [`ExpiryNotice`] is produced on the first observed transition from
    /// positive to non-positive remaining time, at most once per watch, and
    /// only if `ledger` has not already recorded this event id.
    pub fn observe(&mut self, now: DateTime<Utc>, ledger: &dyn NotificationLedger) -> Observation {
        let snapshot = self.target.evaluate(now);
        let crossed = self.last_expired == Some(false) && snapshot.expired;
        self.last_expired = Some(snapshot.expired);

        let mut expiry = None;
        if crossed && !self.notified && self.notifies_on_expiry() {
            self.notified = true;
            let first = match self.event_id.as_deref() {
                Some(id) => ledger.claim(id),
                None => true,
            };
            if first {
                tracing::info!(event_id = ?self.event_id, title = %self.title, "countdown expired");
                expiry = Some(ExpiryNotice {
                    event_id: self.event_id.clone(),
                    title: self.title.clone(),
                    body: format!("{} has arrived.", self.title),
                    at: now,
                });
            } else {
                tracing::debug!(event_id = ?self.event_id, "expiry already announced");
            }
        }

        tracing::trace!(
            mode = %snapshot.mode,
            progress = %snapshot.progress,
            expired = snapshot.expired,
            "countdown tick"
        );
        Observation { snapshot, expiry }
    }
}

/// Run `watch` on `scheduler`, handing every observation to `sink`.
///
/// Expiry notices go to `notifier` in a spawned task; the next tick is
/// scheduled without waiting for delivery, and delivery failures are only
/// logged. The returned [`PendingDeliveries`] lets the host wait for
/// deliveries still in flight before it shuts down.
pub fn spawn_watch<C, L, N, F>(
    scheduler: &mut TickScheduler<C>,
    mut watch: CountdownWatch,
    ledger: Arc<L>,
    notifier: Arc<N>,
    mut sink: F,
) -> Result<PendingDeliveries, SchedulerError>
where
    C: Clock,
    L: NotificationLedger + 'static,
    N: Notifier,
    F: FnMut(&Observation) + Send + 'static,
{
    let pending = PendingDeliveries::new();
    let tracked = pending.clone();
    scheduler.start(move |tick| {
        let observation = watch.observe(tick.now(), &*ledger);
        if let Some(notice) = &observation.expiry {
            let delivery = dispatch(
                Arc::clone(&notifier),
                notice.title.clone(),
                notice.body.clone(),
            );
            if let Some(handle) = delivery {
                tracked.track(handle);
            }
        }
        sink(&observation);
    })?;
    Ok(pending)
}
