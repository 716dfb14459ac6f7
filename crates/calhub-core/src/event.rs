//! The aggregated event value type.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One concrete event occurrence, normalized and ready for output.
///
/// Instances are immutable once produced. The `uid` comes straight from the
/// source document and is not guaranteed unique across sources; collisions
/// are preserved, not deduplicated.
///
/// The serialized field order is the wire contract:
/// `{uid, summary, start, end, recurring, location, description}` with
/// `start`/`end` as offset-free ISO-8601 strings and `end` nullable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Identifier carried by the source document.
    pub uid: String,
    /// Display title; empty when the source omits it.
    pub summary: String,
    /// Canonical start timestamp (naive, UTC-equivalent).
    pub start: NaiveDateTime,
    /// Canonical end timestamp; `None` for point-in-time events.
    pub end: Option<NaiveDateTime>,
    /// Whether this instance was produced by recurrence expansion.
    pub recurring: bool,
    /// Display location; empty when absent.
    pub location: String,
    /// Display description; empty when absent.
    pub description: String,
}

impl Event {
    /// Creates an event with the required fields; display strings default to
    /// empty and `recurring` to false.
    pub fn new(uid: impl Into<String>, start: NaiveDateTime) -> Self {
        Self {
            uid: uid.into(),
            summary: String::new(),
            start,
            end: None,
            recurring: false,
            location: String::new(),
            description: String::new(),
        }
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Builder method to set the end timestamp.
    pub fn with_end(mut self, end: NaiveDateTime) -> Self {
        self.end = Some(end);
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder method to mark the event as a recurrence occurrence.
    pub fn with_recurring(mut self, recurring: bool) -> Self {
        self.recurring = recurring;
        self
    }

    /// Case-insensitive keyword match over summary, location and
    /// description.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        self.summary.to_lowercase().contains(&needle)
            || self.location.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}
