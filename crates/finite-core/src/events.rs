use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::countdown::{ProgressMode, TimeRemaining};

/// Everything the engine reports to a display surface.
/// The CLI prints these as JSON lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    CountdownTick {
        event_id: Option<String>,
        name: String,
        mode: ProgressMode,
        remaining: TimeRemaining,
        progress_pct: f64,
        expired: bool,
        at: DateTime<Utc>,
    },
    /// A bounded countdown just reached its target.
    CountdownExpired {
        event_id: Option<String>,
        name: String,
        at: DateTime<Utc>,
    },
    /// A notification was handed to the terminal.
    NotificationShown {
        title: String,
        body: String,
        at: DateTime<Utc>,
    },
    SchedulerStopped {
        ticks: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Build a tick event from a watch observation.
    pub fn tick(
        event_id: Option<String>,
        name: impl Into<String>,
        snapshot: &crate::countdown::CountdownSnapshot,
        at: DateTime<Utc>,
    ) -> Self {
        Event::CountdownTick {
            event_id,
            name: name.into(),
            mode: snapshot.mode,
            remaining: snapshot.remaining,
            progress_pct: snapshot.progress.rounded(),
            expired: snapshot.expired,
            at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::CountdownTarget;
    use chrono::TimeZone;

    #[test]
    fn tick_event_is_tagged_and_rounded() {
        let now = Utc.with_ymd_and_hms(2024, 7, 2, 0, 0, 0).unwrap();
        let target = CountdownTarget::start_to_target(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        )
        .unwrap();
        let event = Event::tick(Some("e1".into()), "New Year", &target.evaluate(now), now);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "countdown_tick");
        assert_eq!(json["mode"], "start_to_target");
        assert_eq!(json["progress_pct"], 50.0);
        assert_eq!(json["remaining"]["is_negative"], false);
    }
}
