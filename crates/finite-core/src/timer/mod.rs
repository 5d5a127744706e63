mod clock;
mod scheduler;

pub use clock::{ms_to_next_boundary, Clock, ManualClock, SystemClock};
pub use scheduler::{SchedulerState, Tick, TickCanceller, TickScheduler};
