//! Bounded recurrence expansion.
//!
//! An RRULE describes a potentially infinite series. [`expand`] anchors the
//! rule at a base occurrence and materializes only the occurrences whose
//! start falls inside a [`TimeWindow`], turning the series into a finite
//! sequence. All instants are treated as naive UTC; the rule's own timezone
//! qualifiers are ignored because documents are normalized before they reach
//! this stage.

use chrono::{Duration, NaiveDateTime, TimeZone, Utc};
use rrule::RRuleSet;
use thiserror::Error;
use tracing::warn;

use crate::time::TimeWindow;

/// Cap on materialized occurrences per rule. Far above anything a real
/// query window produces; hostile or degenerate rules get truncated here.
const MAX_OCCURRENCES: u16 = 1000;

/// One concrete instance of a recurring series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    /// Occurrence start (canonical form).
    pub start: NaiveDateTime,
    /// Occurrence end; base duration applied to `start`.
    pub end: NaiveDateTime,
}

/// Errors from recurrence expansion.
#[derive(Debug, Error)]
pub enum RecurrenceError {
    /// The rule text did not parse.
    #[error("invalid recurrence rule {rule:?}: {message}")]
    InvalidRule {
        /// The offending RRULE text.
        rule: String,
        /// Parser diagnostic.
        message: String,
    },
}

/// Expands `rule` anchored at `base_start` into occurrences whose start lies
/// in `[window.start, window.end]`, both bounds inclusive.
///
/// Each occurrence spans `base_end - base_start` when `base_end` is present,
/// one hour otherwise. The occurrence end is deliberately not clamped to the
/// window; only starts are bounded.
///
/// The function is pure: calling it again with the same inputs re-materializes
/// the same sequence.
pub fn expand(
    rule: &str,
    base_start: NaiveDateTime,
    base_end: Option<NaiveDateTime>,
    window: &TimeWindow,
) -> Result<Vec<Occurrence>, RecurrenceError> {
    let source = format!(
        "DTSTART:{}\nRRULE:{}",
        base_start.format("%Y%m%dT%H%M%SZ"),
        rule
    );

    let set: RRuleSet = source.parse().map_err(|e| RecurrenceError::InvalidRule {
        rule: rule.to_string(),
        message: format!("{e}"),
    })?;

    // after/before are exclusive; widen by one second so both window bounds
    // are inclusive.
    let tz: rrule::Tz = Utc.into();
    let after = tz.from_utc_datetime(&(window.start - Duration::seconds(1)));
    let before = tz.from_utc_datetime(&(window.end + Duration::seconds(1)));

    let duration = match base_end {
        Some(end) => end - base_start,
        None => Duration::hours(1),
    };

    let result = set.after(after).before(before).all(MAX_OCCURRENCES);
    if result.limited {
        warn!(rule = %rule, cap = MAX_OCCURRENCES, "Recurrence expansion truncated");
    }

    Ok(result
        .dates
        .into_iter()
        .map(|dt| {
            let start = dt.naive_utc();
            Occurrence {
                start,
                end: start + duration,
            }
        })
        .collect())
}
