mod decompose;
mod event;
mod progress;
mod target;
mod watch;

pub use decompose::{
    decompose, decompose_years, TimeRemaining, DAYS_PER_MONTH, DAYS_PER_YEAR, MS_PER_YEAR,
};
pub use event::{CountdownEvent, EventKind, NewEvent, DEFAULT_LIFESPAN_YEARS};
pub use progress::{
    age_progress, span_progress, window_progress, ProgressMode, ProgressValue,
    TARGET_ONLY_WINDOW_MS,
};
pub use target::{parse_instant, progress, CountdownSnapshot, CountdownTarget};
pub use watch::{spawn_watch, CountdownWatch, ExpiryNotice, Observation};
