//! Helpers for working with virtual time.
//!
//! Virtual time is represented as a `Duration` measured from the start of the simulation.

use crate::priv_prelude::*;

pub trait DurationExt {
    /// Builds a duration from a (possibly fractional or negative) number of milliseconds.
    /// Negative and non-finite inputs become zero.
    fn from_millis_f64_saturating(millis: f64) -> Duration;

    /// Whole milliseconds as a signed integer, truncating the sub-millisecond part.
    fn whole_millis(self) -> i64;

    /// Total nanoseconds, saturating at `u64::MAX`.
    fn nanos_u64(self) -> u64;

    /// Ratio between two durations.
    fn div_to_f64(self, other: Duration) -> f64;

    /// Render the duration as `+<nanos>ns`.
    fn to_ns_string(self) -> String;

    /// Parse the output of `to_ns_string`. Fractional values (eg. `+1.5e+09ns`) are accepted
    /// and rounded to the nearest nanosecond.
    fn parse_ns_string(s: &str) -> Option<Duration>;
}

impl DurationExt for Duration {
    fn from_millis_f64_saturating(millis: f64) -> Duration {
        if !millis.is_finite() || millis <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(millis / 1e3).unwrap_or(Duration::MAX)
    }

    fn whole_millis(self) -> i64 {
        i64::try_from(self.as_millis()).unwrap_or(i64::MAX)
    }

    fn nanos_u64(self) -> u64 {
        u64::try_from(self.as_nanos()).unwrap_or(u64::MAX)
    }

    fn div_to_f64(self, other: Duration) -> f64 {
        self.as_secs_f64() / other.as_secs_f64()
    }

    fn to_ns_string(self) -> String {
        format!("+{}ns", self.as_nanos())
    }

    fn parse_ns_string(s: &str) -> Option<Duration> {
        let s = s.strip_suffix("ns")?;
        let s = s.strip_prefix('+').unwrap_or(s);
        if let Ok(nanos) = s.parse::<u64>() {
            return Some(Duration::from_nanos(nanos));
        }
        let nanos = s.parse::<f64>().ok()?;
        if !nanos.is_finite() || nanos < 0.0 {
            return None;
        }
        Some(Duration::from_nanos(nanos.round() as u64))
    }
}

/// Difference `a - b` in milliseconds, each side truncated to whole milliseconds first.
/// Can be negative.
pub fn signed_millis_between(a: Duration, b: Duration) -> i64 {
    a.whole_millis() - b.whole_millis()
}
