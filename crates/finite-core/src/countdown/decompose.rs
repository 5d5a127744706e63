//! Duration decomposition.
//!
//! Splits a raw delta into a calendar-like breakdown using average unit
//! lengths (365.25 days per year, 30.44 days per month). There is no
//! calendar here, only a floating point delta, so the breakdown is an
//! approximation on purpose: converting to calendar-exact month lengths
//! would change every displayed value.

use serde::{Deserialize, Serialize};

pub const SECS_PER_MINUTE: f64 = 60.0;
pub const SECS_PER_HOUR: f64 = 3_600.0;
pub const SECS_PER_DAY: f64 = 86_400.0;
pub const DAYS_PER_YEAR: f64 = 365.25;
pub const DAYS_PER_MONTH: f64 = 30.44;
pub const SECS_PER_YEAR: f64 = SECS_PER_DAY * DAYS_PER_YEAR;
pub const SECS_PER_MONTH: f64 = SECS_PER_DAY * DAYS_PER_MONTH;

/// Milliseconds in an average year.
///
/// Shared by every year-based computation (decomposition and progress) so
/// decomposed time and displayed percentage never disagree.
pub const MS_PER_YEAR: f64 = 1000.0 * 60.0 * 60.0 * 24.0 * 365.25;

/// Decomposed duration, recomputed every tick.
///
/// Each field is what remains after all coarser units were extracted, so
/// `months < 12`, `days < 31`, `hours < 24`, `minutes < 60`, `seconds < 60`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRemaining {
    pub years: u64,
    pub months: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    /// The reference point has been passed and the count runs up past zero.
    pub is_negative: bool,
}

impl TimeRemaining {
    pub const ZERO: TimeRemaining = TimeRemaining {
        years: 0,
        months: 0,
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
        is_negative: false,
    };

    pub fn is_zero(&self) -> bool {
        self.years == 0
            && self.months == 0
            && self.days == 0
            && self.hours == 0
            && self.minutes == 0
            && self.seconds == 0
    }

    /// Rebuild the represented span in milliseconds using the same average
    /// unit lengths the decomposition used.
    pub fn total_ms(&self) -> f64 {
        let secs = self.years as f64 * SECS_PER_YEAR
            + self.months as f64 * SECS_PER_MONTH
            + self.days as f64 * SECS_PER_DAY
            + self.hours as f64 * SECS_PER_HOUR
            + self.minutes as f64 * SECS_PER_MINUTE
            + self.seconds as f64;
        secs * 1000.0
    }
}

/// Decompose a non-negative millisecond delta.
///
/// The caller passes `abs(delta)` and the sign separately. A zero (or
/// non-finite) delta always yields [`TimeRemaining::ZERO`] with
/// `is_negative == false`.
pub fn decompose(delta_ms: f64, is_negative: bool) -> TimeRemaining {
    if !delta_ms.is_finite() || delta_ms <= 0.0 {
        return TimeRemaining::ZERO;
    }

    let mut remaining = delta_ms / 1000.0;
    let years = take(&mut remaining, SECS_PER_YEAR);
    let months = take(&mut remaining, SECS_PER_MONTH);
    let days = take(&mut remaining, SECS_PER_DAY);
    let hours = take(&mut remaining, SECS_PER_HOUR);
    let minutes = take(&mut remaining, SECS_PER_MINUTE);
    let seconds = remaining.floor().clamp(0.0, 59.0) as u64;

    TimeRemaining {
        years,
        months,
        days,
        hours,
        minutes,
        seconds,
        is_negative,
    }
}

/// Decompose a fractional year count (used by age-based countdowns).
///
/// Goes through [`MS_PER_YEAR`] so both forms cascade identically.
pub fn decompose_years(abs_years: f64, is_negative: bool) -> TimeRemaining {
    decompose(abs_years * MS_PER_YEAR, is_negative)
}

/// Extract whole `unit`s from `remaining`, leaving the remainder behind.
fn take(remaining: &mut f64, unit: f64) -> u64 {
    let count = (*remaining / unit).floor().max(0.0);
    // Float rounding can push the remainder a hair below zero.
    *remaining = (*remaining - count * unit).max(0.0);
    count as u64
}
