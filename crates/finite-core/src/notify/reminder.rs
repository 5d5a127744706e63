//! Recurring "life progress" reminders.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use super::Notifier;
use crate::countdown::{DAYS_PER_MONTH, DAYS_PER_YEAR, MS_PER_YEAR};
use crate::error::SchedulerError;
use crate::timer::Clock;

pub const REMINDER_TITLE: &str = "Life Progress Reminder";

const DAY_SECS: u64 = 24 * 60 * 60;
const DAY_MS: i64 = DAY_SECS as i64 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderFrequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl ReminderFrequency {
    pub fn interval(self) -> Duration {
        let days = match self {
            ReminderFrequency::Daily => 1,
            ReminderFrequency::Weekly => 7,
            ReminderFrequency::Monthly => 30,
            ReminderFrequency::Yearly => 365,
        };
        Duration::from_secs(days * DAY_SECS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub frequency: ReminderFrequency,
    /// Personal message appended to every reminder.
    #[serde(default)]
    pub message: String,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            frequency: ReminderFrequency::Daily,
            message: String::new(),
        }
    }
}

/// Coarse remaining-life breakdown used in reminder text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingLife {
    pub years: u64,
    pub months: u64,
    pub weeks: u64,
    pub days: u64,
}

/// Whole days left until `birth + lifespan_years`, split into years,
/// months, weeks and days with the average year and month lengths.
pub fn remaining_life(
    birth: DateTime<Utc>,
    lifespan_years: f64,
    now: DateTime<Utc>,
) -> RemainingLife {
    let end_ms = birth.timestamp_millis() as f64 + lifespan_years * MS_PER_YEAR;
    let total_days = ((end_ms - now.timestamp_millis() as f64) / DAY_MS as f64).floor();
    if !total_days.is_finite() || total_days <= 0.0 {
        return RemainingLife::default();
    }

    let years = (total_days / DAYS_PER_YEAR).floor();
    let mut rest = total_days - years * DAYS_PER_YEAR;
    let months = (rest / DAYS_PER_MONTH).floor().max(0.0);
    rest -= months * DAYS_PER_MONTH;
    let weeks = (rest / 7.0).floor().max(0.0);
    let days = (rest - weeks * 7.0).floor().max(0.0);

    RemainingLife {
        years: years as u64,
        months: months as u64,
        weeks: weeks as u64,
        days: days as u64,
    }
}

impl fmt::Display for RemainingLife {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            (self.years, "year"),
            (self.months, "month"),
            (self.weeks, "week"),
            (self.days, "day"),
        ]
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| {
            if *n == 1 {
                format!("{n} {unit}")
            } else {
                format!("{n} {unit}s")
            }
        })
        .collect();

        if parts.is_empty() {
            f.write_str("0 days")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

pub fn reminder_body(remaining: RemainingLife, message: &str) -> String {
    format!("You have {remaining} left.\n\nPersonal message: {message}")
}

/// Running reminder loop. Dropping or stopping it cancels future reminders.
#[derive(Debug)]
pub struct ReminderHandle {
    handle: JoinHandle<()>,
}

impl ReminderHandle {
    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ReminderHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start sending reminders: once right away, then every `frequency`.
///
/// Returns `Ok(None)` when reminders are disabled. If the notifier denies
/// permission the loop ends without sending anything.
pub fn spawn_reminders<N, C>(
    settings: &ReminderSettings,
    birth: DateTime<Utc>,
    lifespan_years: f64,
    notifier: Arc<N>,
    clock: C,
) -> Result<Option<ReminderHandle>, SchedulerError>
where
    N: Notifier,
    C: Clock,
{
    if !settings.enabled {
        return Ok(None);
    }
    let runtime = tokio::runtime::Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
    let period = settings.frequency.interval();
    let message = settings.message.clone();

    let handle = runtime.spawn(async move {
        if !notifier.request_permission().await {
            tracing::warn!("reminder permission denied, reminders not scheduled");
            return;
        }
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let remaining = remaining_life(birth, lifespan_years, clock.now());
            let body = reminder_body(remaining, &message);
            match notifier.notify(REMINDER_TITLE, &body).await {
                Ok(()) => tracing::info!(%remaining, "reminder sent"),
                Err(e) => tracing::warn!(error = %e, "reminder delivery failed"),
            }
        }
    });
    Ok(Some(ReminderHandle { handle }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn days(n: i64) -> TimeDelta {
        TimeDelta::milliseconds(n * DAY_MS)
    }

    #[test]
    fn splits_days_into_coarse_units() {
        let now = at(2024, 1, 1);
        // 400 days = 365.25 + 30.44 + 4.31
        let birth = now + days(400) - TimeDelta::milliseconds(MS_PER_YEAR as i64);
        let r = remaining_life(birth, 1.0, now);
        assert_eq!(
            r,
            RemainingLife {
                years: 1,
                months: 1,
                weeks: 0,
                days: 4
            }
        );
    }

    #[test]
    fn past_lifespan_is_zero() {
        let r = remaining_life(at(1900, 1, 1), 80.0, at(2024, 1, 1));
        assert_eq!(r, RemainingLife::default());
        assert_eq!(r.to_string(), "0 days");
    }

    #[test]
    fn formats_only_nonzero_parts() {
        let r = RemainingLife {
            years: 3,
            months: 0,
            weeks: 1,
            days: 2,
        };
        assert_eq!(r.to_string(), "3 years, 1 week, 2 days");
    }

    #[test]
    fn body_includes_message() {
        let r = RemainingLife {
            years: 1,
            ..Default::default()
        };
        assert_eq!(
            reminder_body(r, "Call mom"),
            "You have 1 year left.\n\nPersonal message: Call mom"
        );
    }

    #[test]
    fn intervals() {
        assert_eq!(ReminderFrequency::Daily.interval(), Duration::from_secs(86_400));
        assert_eq!(ReminderFrequency::Weekly.interval(), Duration::from_secs(7 * 86_400));
        assert_eq!(ReminderFrequency::Monthly.interval(), Duration::from_secs(30 * 86_400));
        assert_eq!(ReminderFrequency::Yearly.interval(), Duration::from_secs(365 * 86_400));
    }
}
