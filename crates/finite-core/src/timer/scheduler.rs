//! Boundary-aligned tick scheduler.
//!
//! Fires a callback once immediately and then once per wall-clock second.
//! Before every sleep the delay is recomputed from the clock as the distance
//! to the next whole second, so slow callbacks and late timers never
//! accumulate into drift.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Scheduled -> Fired -> Scheduled -> ... -> Cancelled
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut scheduler = TickScheduler::new(SystemClock);
//! scheduler.start(|tick| println!("{} {}", tick.sequence(), tick.now()))?;
//! // ... later, or from inside the callback via `tick.cancel()`:
//! scheduler.stop();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::clock::{ms_to_next_boundary, Clock, SystemClock};
use crate::error::SchedulerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    /// A firing is pending at the next second boundary.
    Scheduled,
    /// The callback is running (or just ran).
    Fired,
    Cancelled,
}

/// State shared between a scheduler, its running task and any cancel
/// handles. One instance per run; a restart gets a fresh one.
#[derive(Debug)]
struct RunState {
    cancelled: AtomicBool,
    wake: Notify,
    state: Mutex<SchedulerState>,
}

impl RunState {
    fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            wake: Notify::new(),
            state: Mutex::new(SchedulerState::Idle),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.set_state(SchedulerState::Cancelled);
            // notify_one stores a permit, so a sleep entered after this
            // still observes the cancellation.
            self.wake.notify_one();
        }
    }

    fn state(&self) -> SchedulerState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(SchedulerState::Cancelled)
    }

    /// Cancelled is terminal for a run.
    fn set_state(&self, next: SchedulerState) {
        if let Ok(mut state) = self.state.lock() {
            if *state != SchedulerState::Cancelled {
                *state = next;
            }
        }
    }
}

/// Cancels one scheduler run. Cheap to clone; safe to call any number of
/// times, from any thread, including from inside the tick callback.
#[derive(Debug, Clone)]
pub struct TickCanceller {
    run: Arc<RunState>,
}

impl TickCanceller {
    pub fn cancel(&self) {
        self.run.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.run.is_cancelled()
    }
}

/// What the callback sees on each firing.
#[derive(Debug)]
pub struct Tick<'a> {
    sequence: u64,
    now: DateTime<Utc>,
    run: &'a Arc<RunState>,
}

impl Tick<'_> {
    /// 0 for the immediate firing, then 1, 2, ...
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Clock reading taken just before the callback was invoked.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Stop the run from inside the callback. No further firing happens.
    pub fn cancel(&self) {
        self.run.cancel();
    }

    pub fn canceller(&self) -> TickCanceller {
        TickCanceller {
            run: Arc::clone(self.run),
        }
    }
}

/// Cancellable once-per-second scheduler.
///
/// Each display owns one. At most one firing is ever pending for an
/// instance: starting again cancels the previous run first.
pub struct TickScheduler<C: Clock = SystemClock> {
    clock: Arc<C>,
    run: Arc<RunState>,
    handle: Option<JoinHandle<()>>,
}

impl TickScheduler<SystemClock> {
    pub fn system() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> TickScheduler<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock: Arc::new(clock),
            run: Arc::new(RunState::new()),
            handle: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SchedulerState {
        self.run.state()
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.state(),
            SchedulerState::Scheduled | SchedulerState::Fired
        ) && !self.run.is_cancelled()
    }

    /// Handle that cancels the current run.
    pub fn canceller(&self) -> TickCanceller {
        TickCanceller {
            run: Arc::clone(&self.run),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start firing `callback`. The first firing happens right away.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&mut self, callback: F) -> Result<(), SchedulerError>
    where
        F: FnMut(&Tick<'_>) + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        self.stop();

        let run = Arc::new(RunState::new());
        run.set_state(SchedulerState::Scheduled);
        self.run = Arc::clone(&run);
        let clock = Arc::clone(&self.clock);
        self.handle = Some(runtime.spawn(run_ticks(clock, run, callback)));
        tracing::debug!("tick scheduler started");
        Ok(())
    }

    /// Cancel the pending firing. Idempotent.
    pub fn stop(&mut self) {
        self.run.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("tick scheduler stopped");
        }
    }

    /// Wait for the current run to end, e.g. after the callback cancelled
    /// itself. Returns immediately if nothing was started.
    pub async fn finished(&mut self) {
        if let Some(handle) = self.handle.take() {
            // A JoinError here only means the task was aborted.
            let _ = handle.await;
        }
    }
}

impl<C: Clock> Drop for TickScheduler<C> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_ticks<C, F>(clock: Arc<C>, run: Arc<RunState>, mut callback: F)
where
    C: Clock,
    F: FnMut(&Tick<'_>) + Send + 'static,
{
    let mut sequence = 0u64;
    loop {
        if run.is_cancelled() {
            break;
        }
        run.set_state(SchedulerState::Fired);
        let tick = Tick {
            sequence,
            now: clock.now(),
            run: &run,
        };
        callback(&tick);
        sequence += 1;

        if run.is_cancelled() {
            break;
        }
        let delay = ms_to_next_boundary(clock.now_ms());
        run.set_state(SchedulerState::Scheduled);
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
            _ = run.wake.notified() => break,
        }
    }
    run.set_state(SchedulerState::Cancelled);
}
