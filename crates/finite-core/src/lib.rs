//! # Finite Core Library
//!
//! This library provides the core logic for Finite, a life countdown. The
//! CLI binary and any other display surface are thin layers over it.
//!
//! ## Architecture
//!
//! - **Countdown Engine**: turns a [`CountdownTarget`] and the current time
//!   into a decomposed [`TimeRemaining`] plus a [`ProgressValue`]
//! - **Tick Scheduler**: a cancellable, second-boundary-aligned repeating
//!   callback that drives the engine
//! - **Notifications**: expiry notices and recurring life reminders,
//!   delivered through a host-supplied [`Notifier`]
//! - **Storage**: SQLite event catalog and notification flags, TOML
//!   configuration
//!
//! ## Key Components
//!
//! - [`CountdownTarget`]: validated description of what is counted towards
//! - [`CountdownWatch`]: per-display evaluation with one-shot expiry
//! - [`TickScheduler`]: drift-free once-per-second ticks
//! - [`Database`]: event catalog and [`NotificationLedger`]
//! - [`Config`]: application configuration management

pub mod countdown;
pub mod error;
pub mod events;
pub mod notify;
pub mod storage;
pub mod timer;

pub use countdown::{
    decompose, decompose_years, progress, spawn_watch, CountdownEvent, CountdownSnapshot,
    CountdownTarget, CountdownWatch, EventKind, ExpiryNotice, NewEvent, Observation,
    ProgressMode, ProgressValue, TimeRemaining, MS_PER_YEAR,
};
pub use error::{ConfigError, CoreError, DatabaseError, NotifyError, SchedulerError, ValidationError};
pub use events::Event;
pub use notify::{MemoryLedger, NotificationLedger, Notifier, PendingDeliveries, ReminderSettings};
pub use storage::{Config, Database};
pub use timer::{Clock, ManualClock, SchedulerState, SystemClock, Tick, TickScheduler};
