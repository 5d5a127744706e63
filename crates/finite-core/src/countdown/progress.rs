//! Progress calculation.
//!
//! All three modes produce a percentage. Only the age mode may overshoot
//! 100, and only when the caller asks for it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::decompose::MS_PER_YEAR;

/// Reference window used when a countdown has a target but no start.
pub const TARGET_ONLY_WINDOW_MS: f64 = 365.0 * 24.0 * 60.0 * 60.0 * 1000.0;

/// Which interval a progress value is measured along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressMode {
    AgeVsExpectancy,
    StartToTarget,
    TargetOnly,
}

impl fmt::Display for ProgressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProgressMode::AgeVsExpectancy => "age_vs_expectancy",
            ProgressMode::StartToTarget => "start_to_target",
            ProgressMode::TargetOnly => "target_only",
        };
        f.write_str(s)
    }
}

/// Percentage complete, `>= 0`. Displays with one decimal.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressValue(f64);

impl ProgressValue {
    pub const ZERO: ProgressValue = ProgressValue(0.0);
    pub const COMPLETE: ProgressValue = ProgressValue(100.0);

    pub fn value(self) -> f64 {
        self.0
    }

    /// 0.0 .. 1.0 fraction, for progress bars. Overshoot is not clamped.
    pub fn fraction(self) -> f64 {
        self.0 / 100.0
    }

    /// Rounded to the single displayed decimal.
    pub fn rounded(self) -> f64 {
        (self.0 * 10.0).round() / 10.0
    }

    fn clamped(pct: f64) -> Self {
        Self(sanitize(pct).clamp(0.0, 100.0))
    }

    fn floored(pct: f64) -> Self {
        Self(sanitize(pct).max(0.0))
    }
}

impl fmt::Display for ProgressValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

fn sanitize(pct: f64) -> f64 {
    if pct.is_nan() {
        0.0
    } else {
        pct
    }
}

/// Share of the expected lifespan already lived.
///
/// With `allow_overflow` the upper bound is lifted so a countdown that keeps
/// running past expiry can show values above 100.
pub fn age_progress(age_ms: f64, expectancy_years: f64, allow_overflow: bool) -> ProgressValue {
    let age_years = age_ms / MS_PER_YEAR;
    let pct = age_years / expectancy_years * 100.0;
    if allow_overflow {
        ProgressValue::floored(pct)
    } else {
        ProgressValue::clamped(pct)
    }
}

/// Position of `now_ms` between `start_ms` and `target_ms`.
///
/// A zero-length interval is complete once `now` reaches the target.
pub fn span_progress(start_ms: i64, target_ms: i64, now_ms: i64) -> ProgressValue {
    let span = target_ms - start_ms;
    if span == 0 {
        return if now_ms >= target_ms {
            ProgressValue::COMPLETE
        } else {
            ProgressValue::ZERO
        };
    }
    let elapsed = (now_ms - start_ms) as f64;
    ProgressValue::clamped(elapsed / span as f64 * 100.0)
}

/// Progress towards a target with no known start, measured against a fixed
/// one-year window ending at the target.
pub fn window_progress(target_ms: i64, now_ms: i64) -> ProgressValue {
    let left = (target_ms - now_ms).max(0) as f64;
    ProgressValue::clamped((1.0 - left / TARGET_ONLY_WINDOW_MS) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DAY_MS: i64 = 86_400_000;

    #[test]
    fn forty_of_eighty_is_half() {
        let p = age_progress(40.0 * MS_PER_YEAR, 80.0, false);
        assert!((p.value() - 50.0).abs() < 1e-9);
        assert_eq!(p.to_string(), "50.0");
    }

    #[test]
    fn age_overflow_only_when_allowed() {
        let age = 81.0 * MS_PER_YEAR;
        assert_eq!(age_progress(age, 80.0, false), ProgressValue::COMPLETE);
        assert!(age_progress(age, 80.0, true).value() > 100.0);
    }

    #[test]
    fn unborn_age_is_zero_in_both_modes() {
        assert_eq!(age_progress(-MS_PER_YEAR, 80.0, false), ProgressValue::ZERO);
        assert_eq!(age_progress(-MS_PER_YEAR, 80.0, true), ProgressValue::ZERO);
    }

    #[test]
    fn degenerate_span_is_step_function() {
        assert_eq!(span_progress(1_000, 1_000, 999), ProgressValue::ZERO);
        assert_eq!(span_progress(1_000, 1_000, 1_000), ProgressValue::COMPLETE);
        assert_eq!(span_progress(1_000, 1_000, 5_000), ProgressValue::COMPLETE);
    }

    #[test]
    fn span_is_clamped() {
        assert_eq!(span_progress(0, 10, -5), ProgressValue::ZERO);
        assert_eq!(span_progress(0, 10, 50), ProgressValue::COMPLETE);
        assert_eq!(span_progress(0, 10, 5).value(), 50.0);
    }

    #[test]
    fn thirty_days_left_of_a_year_window() {
        let p = window_progress(30 * DAY_MS, 0);
        assert!((p.value() - (1.0 - 30.0 / 365.0) * 100.0).abs() < 1e-9);
        assert_eq!(p.to_string(), "91.8");
    }

    #[test]
    fn window_is_complete_after_target_and_empty_beyond_a_year() {
        assert_eq!(window_progress(0, 10 * DAY_MS), ProgressValue::COMPLETE);
        assert_eq!(window_progress(400 * DAY_MS, 0), ProgressValue::ZERO);
    }

    #[test]
    fn rounded_keeps_one_decimal() {
        assert_eq!(ProgressValue(33.333).rounded(), 33.3);
        assert!((ProgressValue(66.66).fraction() - 0.6666).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn clamped_age_stays_in_range(age in -1.0e13f64..1.0e13, exp in 0.1f64..150.0) {
            let p = age_progress(age, exp, false).value();
            prop_assert!((0.0..=100.0).contains(&p));
        }

        #[test]
        fn overflowing_age_is_never_negative(age in -1.0e13f64..1.0e13, exp in 0.1f64..150.0) {
            prop_assert!(age_progress(age, exp, true).value() >= 0.0);
        }

        #[test]
        fn span_stays_in_range(start in -1_000_000i64..1_000_000, len in 0i64..1_000_000, now in -3_000_000i64..3_000_000) {
            let p = span_progress(start, start + len, now).value();
            prop_assert!((0.0..=100.0).contains(&p));
        }
    }
}
