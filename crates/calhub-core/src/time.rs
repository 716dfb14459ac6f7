//! Canonical time handling.
//!
//! Calendar documents mix zone-qualified timestamps, floating (naive)
//! timestamps and date-only values. [`normalize`] folds every one of them
//! into a single comparable form: a [`NaiveDateTime`] that is UTC-equivalent
//! with no residual offset. Every comparison, subtraction and sort in the
//! rest of the workspace assumes this form, so normalization happens once,
//! at the parsing boundary.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::warn;

/// A temporal value as it appears in a calendar document, before
/// normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemporalValue {
    /// A date with no time-of-day (all-day events).
    Date(NaiveDate),
    /// A timestamp with no zone information, assumed to already be UTC.
    Floating(NaiveDateTime),
    /// A zone-aware timestamp in UTC.
    Utc(DateTime<Utc>),
    /// A local timestamp qualified by an IANA timezone identifier.
    Zoned {
        /// The wall-clock time in the named zone.
        datetime: NaiveDateTime,
        /// The IANA identifier, e.g. `Europe/Paris`.
        tzid: String,
    },
}

/// Errors from temporal normalization.
#[derive(Debug, Error)]
pub enum TimeError {
    /// The value cannot be mapped onto the canonical form.
    #[error("unsupported temporal type: {0}")]
    UnsupportedTemporalType(String),
}

/// Converts a [`TemporalValue`] into the canonical timestamp form.
///
/// - zone-aware input is converted to UTC and the offset marker stripped
/// - floating input passes through unchanged (assumed UTC)
/// - date-only input becomes midnight UTC on that date
///
/// A `Zoned` value with an unknown TZID is treated as already-UTC with a
/// warning. A local instant that does not exist in its zone (DST gap) fails
/// with [`TimeError::UnsupportedTemporalType`]; callers drop the single
/// affected component rather than the whole document.
///
/// Normalization is idempotent: feeding a canonical value back through (as
/// `Floating`) returns it unchanged.
pub fn normalize(value: TemporalValue) -> Result<NaiveDateTime, TimeError> {
    match value {
        TemporalValue::Utc(dt) => Ok(dt.naive_utc()),
        TemporalValue::Floating(dt) => Ok(dt),
        TemporalValue::Date(date) => Ok(date.and_hms_opt(0, 0, 0).expect("valid time")),
        TemporalValue::Zoned { datetime, tzid } => match tzid.parse::<Tz>() {
            Ok(tz) => tz
                .from_local_datetime(&datetime)
                .earliest()
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| {
                    TimeError::UnsupportedTemporalType(format!(
                        "local time {datetime} does not exist in timezone {tzid}"
                    ))
                }),
            Err(_) => {
                warn!(tzid = %tzid, "Unknown TZID, treating local time as UTC");
                Ok(datetime)
            }
        },
    }
}

/// A query window over canonical timestamps.
///
/// Both bounds are inclusive: an event starting exactly at `start` or
/// exactly at `end` is inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: NaiveDateTime,
    /// End of the window (inclusive).
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Creates a new window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Window covering `[now, now + days]` from an explicit `now`.
    pub fn next_days_from(now: NaiveDateTime, days: u32) -> Self {
        Self::new(now, now + Duration::days(i64::from(days)))
    }

    /// Window covering the next `days` days from the current instant.
    pub fn next_days(days: u32) -> Self {
        Self::next_days_from(Utc::now().naive_utc(), days)
    }

    /// Whether `dt` falls inside the window, bounds included.
    pub fn contains(&self, dt: NaiveDateTime) -> bool {
        self.start <= dt && dt <= self.end
    }

    /// Length of the window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn utc_input_strips_offset() {
        let dt = Utc.with_ymd_and_hms(2025, 2, 5, 10, 30, 0).unwrap();
        let normalized = normalize(TemporalValue::Utc(dt)).unwrap();
        assert_eq!(normalized, naive(2025, 2, 5, 10, 30, 0));
    }

    #[test]
    fn floating_input_passes_through() {
        let dt = naive(2025, 2, 5, 10, 30, 0);
        assert_eq!(normalize(TemporalValue::Floating(dt)).unwrap(), dt);
    }

    #[test]
    fn date_only_becomes_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 5).unwrap();
        let normalized = normalize(TemporalValue::Date(date)).unwrap();
        assert_eq!(normalized, naive(2025, 2, 5, 0, 0, 0));
    }

    #[test]
    fn zoned_input_converts_to_utc() {
        // 10:00 in New York (EST, UTC-5) is 15:00 UTC.
        let normalized = normalize(TemporalValue::Zoned {
            datetime: naive(2025, 2, 5, 10, 0, 0),
            tzid: "America/New_York".to_string(),
        })
        .unwrap();
        assert_eq!(normalized, naive(2025, 2, 5, 15, 0, 0));
    }

    #[test]
    fn unknown_tzid_assumes_utc() {
        let dt = naive(2025, 2, 5, 10, 0, 0);
        let normalized = normalize(TemporalValue::Zoned {
            datetime: dt,
            tzid: "Not/AZone".to_string(),
        })
        .unwrap();
        assert_eq!(normalized, dt);
    }

    #[test]
    fn nonexistent_local_time_is_rejected() {
        // 2:30 on 2025-03-09 falls inside the US spring-forward gap.
        let result = normalize(TemporalValue::Zoned {
            datetime: naive(2025, 3, 9, 2, 30, 0),
            tzid: "America/New_York".to_string(),
        });
        assert!(matches!(
            result,
            Err(TimeError::UnsupportedTemporalType(_))
        ));
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = vec![
            TemporalValue::Utc(Utc.with_ymd_and_hms(2025, 2, 5, 10, 30, 0).unwrap()),
            TemporalValue::Date(NaiveDate::from_ymd_opt(2025, 2, 5).unwrap()),
            TemporalValue::Zoned {
                datetime: naive(2025, 6, 1, 9, 0, 0),
                tzid: "Europe/Paris".to_string(),
            },
        ];
        for input in inputs {
            let once = normalize(input).unwrap();
            let twice = normalize(TemporalValue::Floating(once)).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let window = TimeWindow::new(naive(2025, 2, 5, 9, 0, 0), naive(2025, 2, 8, 9, 0, 0));

        assert!(window.contains(naive(2025, 2, 5, 9, 0, 0)));
        assert!(window.contains(naive(2025, 2, 8, 9, 0, 0)));
        assert!(window.contains(naive(2025, 2, 6, 12, 0, 0)));
        assert!(!window.contains(naive(2025, 2, 5, 8, 59, 59)));
        assert!(!window.contains(naive(2025, 2, 8, 9, 0, 1)));
    }

    #[test]
    fn next_days_from_spans_requested_days() {
        let now = naive(2025, 2, 5, 12, 0, 0);
        let window = TimeWindow::next_days_from(now, 3);
        assert_eq!(window.start, now);
        assert_eq!(window.end, naive(2025, 2, 8, 12, 0, 0));
        assert_eq!(window.duration(), Duration::days(3));
    }

    #[test]
    #[should_panic(expected = "start must be <= end")]
    fn inverted_window_panics() {
        TimeWindow::new(naive(2025, 2, 8, 0, 0, 0), naive(2025, 2, 5, 0, 0, 0));
    }
}
