//! Countdown targets and per-tick evaluation.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde::Serialize;

use super::decompose::{decompose, decompose_years, TimeRemaining, MS_PER_YEAR};
use super::progress::{age_progress, span_progress, window_progress, ProgressMode, ProgressValue};
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
enum Interval {
    AgeVsExpectancy {
        birth: DateTime<Utc>,
        expectancy_years: f64,
    },
    StartToTarget {
        start: DateTime<Utc>,
        target: DateTime<Utc>,
    },
    TargetOnly {
        target: DateTime<Utc>,
    },
}

/// What is being counted towards, and how progress is measured.
///
/// Built by the display layer whenever its parameters change. Constructors
/// validate their input so evaluation never has to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountdownTarget {
    #[serde(flatten)]
    interval: Interval,
    allow_negative: bool,
}

/// One tick's worth of output for a display surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountdownSnapshot {
    pub mode: ProgressMode,
    pub remaining: TimeRemaining,
    pub progress: ProgressValue,
    /// The target has been reached (remaining delta is zero or below).
    pub expired: bool,
}

impl CountdownTarget {
    /// Life countdown: birth date plus expected lifespan in years.
    pub fn age_vs_expectancy(
        birth: DateTime<Utc>,
        expectancy_years: f64,
    ) -> Result<Self, ValidationError> {
        if !expectancy_years.is_finite() || expectancy_years <= 0.0 {
            return Err(ValidationError::NonPositiveExpectancy {
                value: expectancy_years,
            });
        }
        if life_end(birth, expectancy_years).is_none() {
            return Err(ValidationError::LifespanOutOfRange {
                value: expectancy_years,
            });
        }
        Ok(Self {
            interval: Interval::AgeVsExpectancy {
                birth,
                expectancy_years,
            },
            allow_negative: false,
        })
    }

    /// Countdown over a known interval. `start == target` is allowed.
    pub fn start_to_target(
        start: DateTime<Utc>,
        target: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if target < start {
            return Err(ValidationError::InvalidTimeRange { start, end: target });
        }
        Ok(Self {
            interval: Interval::StartToTarget { start, target },
            allow_negative: false,
        })
    }

    /// Countdown with no known start.
    pub fn target_only(target: DateTime<Utc>) -> Self {
        Self {
            interval: Interval::TargetOnly { target },
            allow_negative: false,
        }
    }

    /// Keep counting up past the target instead of stopping at zero.
    pub fn with_allow_negative(mut self, allow_negative: bool) -> Self {
        self.allow_negative = allow_negative;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> ProgressMode {
        match self.interval {
            Interval::AgeVsExpectancy { .. } => ProgressMode::AgeVsExpectancy,
            Interval::StartToTarget { .. } => ProgressMode::StartToTarget,
            Interval::TargetOnly { .. } => ProgressMode::TargetOnly,
        }
    }

    pub fn allow_negative(&self) -> bool {
        self.allow_negative
    }

    /// Birth date or start date, if the mode has one.
    pub fn reference_point(&self) -> Option<DateTime<Utc>> {
        match self.interval {
            Interval::AgeVsExpectancy { birth, .. } => Some(birth),
            Interval::StartToTarget { start, .. } => Some(start),
            Interval::TargetOnly { .. } => None,
        }
    }

    pub fn expectancy_years(&self) -> Option<f64> {
        match self.interval {
            Interval::AgeVsExpectancy {
                expectancy_years, ..
            } => Some(expectancy_years),
            _ => None,
        }
    }

    /// The instant the countdown reaches zero.
    ///
    /// For life countdowns this is the birth date plus the expectancy in
    /// average years.
    pub fn target(&self) -> DateTime<Utc> {
        match self.interval {
            Interval::AgeVsExpectancy {
                birth,
                expectancy_years,
            } => life_end(birth, expectancy_years).unwrap_or(DateTime::<Utc>::MAX_UTC),
            Interval::StartToTarget { target, .. } | Interval::TargetOnly { target } => target,
        }
    }

    // ── Evaluation ───────────────────────────────────────────────────

    /// Compute the snapshot for `now`.
    pub fn evaluate(&self, now: DateTime<Utc>) -> CountdownSnapshot {
        let now_ms = now.timestamp_millis();
        let (remaining, expired) = match self.interval {
            Interval::AgeVsExpectancy {
                birth,
                expectancy_years,
            } => {
                let age_years = (now_ms - birth.timestamp_millis()) as f64 / MS_PER_YEAR;
                let left_years = expectancy_years - age_years;
                let expired = left_years <= 0.0;
                let remaining = if !expired {
                    decompose_years(left_years, false)
                } else if self.allow_negative {
                    decompose_years(-left_years, true)
                } else {
                    TimeRemaining::ZERO
                };
                (remaining, expired)
            }
            Interval::StartToTarget { target, .. } | Interval::TargetOnly { target } => {
                let delta = target.timestamp_millis() - now_ms;
                let expired = delta <= 0;
                let remaining = if !expired {
                    decompose(delta as f64, false)
                } else if self.allow_negative {
                    decompose(delta.unsigned_abs() as f64, true)
                } else {
                    TimeRemaining::ZERO
                };
                (remaining, expired)
            }
        };

        CountdownSnapshot {
            mode: self.mode(),
            remaining,
            progress: self.progress_at(now_ms),
            expired,
        }
    }

    fn progress_at(&self, now_ms: i64) -> ProgressValue {
        match self.interval {
            Interval::AgeVsExpectancy {
                birth,
                expectancy_years,
            } => {
                let age_ms = (now_ms - birth.timestamp_millis()) as f64;
                age_progress(age_ms, expectancy_years, self.allow_negative)
            }
            Interval::StartToTarget { start, target } => {
                span_progress(start.timestamp_millis(), target.timestamp_millis(), now_ms)
            }
            Interval::TargetOnly { target } => window_progress(target.timestamp_millis(), now_ms),
        }
    }
}

/// `birth + expectancy_years`, or `None` when that instant cannot be
/// represented.
fn life_end(birth: DateTime<Utc>, expectancy_years: f64) -> Option<DateTime<Utc>> {
    let ms = expectancy_years * MS_PER_YEAR;
    if !ms.is_finite() || ms.abs() >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(ms as i64).and_then(|delta| birth.checked_add_signed(delta))
}

/// Progress of `target` at `now`.
pub fn progress(target: &CountdownTarget, now: DateTime<Utc>) -> ProgressValue {
    target.progress_at(now.timestamp_millis())
}

/// Parse a user-supplied instant.
///
/// Accepts RFC 3339 (`2024-07-02T12:00:00Z`), a naive date-time
/// (`2024-07-02T12:00:00`, read as UTC) or a bare date (`2024-07-02`,
/// midnight UTC).
pub fn parse_instant(input: &str) -> Result<DateTime<Utc>, ValidationError> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValidationError::InvalidDate(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn years_before(now: DateTime<Utc>, years: f64) -> DateTime<Utc> {
        now - TimeDelta::milliseconds((years * MS_PER_YEAR) as i64)
    }

    #[test]
    fn rejects_lifespan_past_the_calendar() {
        let birth = at(1990, 1, 1);
        for years in [1e9, 1e300, 300_000.0] {
            assert_eq!(
                CountdownTarget::age_vs_expectancy(birth, years),
                Err(ValidationError::LifespanOutOfRange { value: years })
            );
        }
    }

    #[test]
    fn long_but_representable_lifespan_still_counts_down() {
        let birth = at(1990, 1, 1);
        let t = CountdownTarget::age_vs_expectancy(birth, 10_000.0).unwrap();
        assert!(t.target() > at(9999, 1, 1));
        let snap = t.evaluate(at(2024, 1, 1));
        assert!(!snap.expired);
        assert_eq!(snap.remaining.years, 9966);
    }

    #[test]
    fn rejects_non_positive_expectancy() {
        let birth = at(1990, 1, 1);
        assert!(CountdownTarget::age_vs_expectancy(birth, 0.0).is_err());
        assert!(CountdownTarget::age_vs_expectancy(birth, -5.0).is_err());
        assert!(CountdownTarget::age_vs_expectancy(birth, f64::NAN).is_err());
    }

    #[test]
    fn rejects_target_before_start() {
        let err = CountdownTarget::start_to_target(at(2025, 1, 1), at(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTimeRange { .. }));
    }

    #[test]
    fn middle_of_a_leap_year() {
        let t = CountdownTarget::start_to_target(at(2024, 1, 1), at(2025, 1, 1)).unwrap();
        let snap = t.evaluate(at(2024, 7, 2));
        assert!((snap.progress.value() - 50.0).abs() <= 0.2);
        assert!(!snap.expired);
        assert_eq!(snap.mode, ProgressMode::StartToTarget);
    }

    #[test]
    fn age_forty_of_eighty() {
        let now = at(2024, 6, 1);
        let t = CountdownTarget::age_vs_expectancy(years_before(now, 40.0), 80.0).unwrap();
        let snap = t.evaluate(now);
        assert!((snap.progress.value() - 50.0).abs() < 1e-6);
        assert_eq!(snap.remaining.years, 40);
        assert!(!snap.remaining.is_negative);
    }

    #[test]
    fn life_countdown_past_expectancy_counts_up() {
        let now = at(2024, 6, 1);
        let t = CountdownTarget::age_vs_expectancy(years_before(now, 81.0), 80.0)
            .unwrap()
            .with_allow_negative(true);
        let snap = t.evaluate(now);
        assert!(snap.expired);
        assert!(snap.remaining.is_negative);
        assert_eq!(snap.remaining.years, 1);
        assert!(snap.progress.value() > 100.0);
    }

    #[test]
    fn past_target_without_negative_is_zero() {
        let now = at(2024, 6, 1);
        let t = CountdownTarget::target_only(at(2024, 5, 1));
        let snap = t.evaluate(now);
        assert!(snap.expired);
        assert_eq!(snap.remaining, TimeRemaining::ZERO);
        assert_eq!(snap.progress, ProgressValue::COMPLETE);
    }

    #[test]
    fn past_target_with_negative_counts_up() {
        let now = at(2024, 6, 1);
        let t = CountdownTarget::target_only(now - TimeDelta::seconds(90_061)).with_allow_negative(true);
        let r = t.evaluate(now).remaining;
        assert!(r.is_negative);
        assert_eq!((r.days, r.hours, r.minutes, r.seconds), (1, 1, 1, 1));
    }

    #[test]
    fn target_only_thirty_days_out() {
        let now = at(2024, 6, 1);
        let t = CountdownTarget::target_only(now + TimeDelta::days(30));
        let p = progress(&t, now);
        assert!((p.value() - 91.78).abs() < 0.01);
    }

    #[test]
    fn reaching_target_exactly_is_expired() {
        let now = at(2024, 6, 1);
        let snap = CountdownTarget::target_only(now).evaluate(now);
        assert!(snap.expired);
        assert!(!snap.remaining.is_negative);
    }

    #[test]
    fn life_target_is_birth_plus_average_years() {
        let t = CountdownTarget::age_vs_expectancy(at(2000, 1, 1), 1.0).unwrap();
        assert_eq!(t.target(), at(2000, 1, 1) + TimeDelta::milliseconds(MS_PER_YEAR as i64));
        assert_eq!(t.reference_point(), Some(at(2000, 1, 1)));
        assert_eq!(t.expectancy_years(), Some(1.0));
    }

    #[test]
    fn parses_supported_formats() {
        assert_eq!(parse_instant("2024-07-02").unwrap(), at(2024, 7, 2));
        assert_eq!(
            parse_instant("2024-07-02T06:30:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 7, 2, 6, 30, 0).unwrap()
        );
        assert_eq!(
            parse_instant("2024-07-02T08:30:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 7, 2, 6, 30, 0).unwrap()
        );
        assert!(parse_instant("next tuesday").is_err());
    }
}
