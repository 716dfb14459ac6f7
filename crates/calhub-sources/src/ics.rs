//! ICS document parsing and windowing.
//!
//! This is the shared pipeline both source variants feed their raw document
//! through: parse the iCalendar text, normalize each component's temporal
//! values to the canonical form, expand recurrence rules bounded by the
//! query window, and keep only events whose start falls inside it.

use calhub_core::{Event, TemporalValue, TimeWindow, expand, normalize};
use icalendar::{Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, EventLike};
use tracing::{debug, warn};

use crate::error::{SourceError, SourceResult};

/// Parses `ics` and returns every event whose start falls inside `window`
/// (both bounds inclusive).
///
/// Components carrying an RRULE are expanded into one event per occurrence
/// within the window, flagged `recurring`. A component that cannot be
/// processed (missing DTSTART, unsupported temporal value, unparseable
/// rule) is skipped with a warning; it never fails the whole document.
pub fn collect_events(ics: &str, window: &TimeWindow) -> SourceResult<Vec<Event>> {
    collect_filtered(ics, window, None)
}

/// Same pipeline as [`collect_events`], keeping only events that match
/// `keyword` (case-insensitive, over summary/location/description).
pub fn collect_events_matching(
    ics: &str,
    keyword: &str,
    window: &TimeWindow,
) -> SourceResult<Vec<Event>> {
    collect_filtered(ics, window, Some(keyword))
}

fn collect_filtered(
    ics: &str,
    window: &TimeWindow,
    keyword: Option<&str>,
) -> SourceResult<Vec<Event>> {
    let calendar: Calendar = ics
        .parse()
        .map_err(|e| SourceError::invalid_document(format!("failed to parse calendar document: {e}")))?;

    let mut events = Vec::new();
    for component in calendar.iter() {
        let CalendarComponent::Event(vevent) = component else {
            continue;
        };
        match expand_component(vevent, window) {
            Ok(mut expanded) => {
                if let Some(keyword) = keyword {
                    expanded.retain(|event| event.matches_keyword(keyword));
                }
                events.append(&mut expanded);
            }
            Err(reason) => warn!(reason = %reason, "Skipping event component"),
        }
    }
    Ok(events)
}

/// Turns one VEVENT into its windowed events: a single non-recurring event,
/// or one event per in-window occurrence of its rule.
fn expand_component(vevent: &icalendar::Event, window: &TimeWindow) -> Result<Vec<Event>, String> {
    let uid = vevent.get_uid().unwrap_or_default().to_string();
    let summary = vevent.get_summary().unwrap_or_default().to_string();
    let location = vevent.get_location().unwrap_or_default().to_string();
    let description = vevent.get_description().unwrap_or_default().to_string();

    let Some(dtstart) = vevent.get_start() else {
        return Err(format!("component {uid:?} has no DTSTART"));
    };
    let start =
        normalize(temporal_value(dtstart)).map_err(|e| format!("component {uid:?}: {e}"))?;
    let end = match vevent.get_end() {
        Some(dtend) => {
            Some(normalize(temporal_value(dtend)).map_err(|e| format!("component {uid:?}: {e}"))?)
        }
        None => None,
    };

    if let Some(rule) = vevent.property_value("RRULE") {
        let occurrences =
            expand(rule, start, end, window).map_err(|e| format!("component {uid:?}: {e}"))?;
        debug!(uid = %uid, count = occurrences.len(), "Expanded recurring component");
        Ok(occurrences
            .into_iter()
            .map(|occ| Event {
                uid: uid.clone(),
                summary: summary.clone(),
                start: occ.start,
                end: Some(occ.end),
                recurring: true,
                location: location.clone(),
                description: description.clone(),
            })
            .collect())
    } else if window.contains(start) {
        Ok(vec![Event {
            uid,
            summary,
            start,
            end,
            recurring: false,
            location,
            description,
        }])
    } else {
        Ok(Vec::new())
    }
}

/// Maps the parser's date-or-datetime onto the core temporal value.
fn temporal_value(dt: DatePerhapsTime) -> TemporalValue {
    match dt {
        DatePerhapsTime::Date(date) => TemporalValue::Date(date),
        DatePerhapsTime::DateTime(cdt) => match cdt {
            CalendarDateTime::Utc(dt) => TemporalValue::Utc(dt),
            CalendarDateTime::Floating(naive) => TemporalValue::Floating(naive),
            CalendarDateTime::WithTimezone { date_time, tzid } => TemporalValue::Zoned {
                datetime: date_time,
                tzid,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn february_window() -> TimeWindow {
        TimeWindow::new(naive(2025, 2, 1, 0, 0), naive(2025, 2, 28, 0, 0))
    }

    const BASIC_ICS: &str = "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Test//Test//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:meeting-1@example.com\r\n\
         DTSTART:20250205T100000Z\r\n\
         DTEND:20250205T110000Z\r\n\
         SUMMARY:Team Meeting\r\n\
         LOCATION:Conference Room A\r\n\
         DESCRIPTION:Weekly sync\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR";

    const ALL_DAY_ICS: &str = "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         BEGIN:VEVENT\r\n\
         UID:holiday-1@example.com\r\n\
         DTSTART;VALUE=DATE:20250210\r\n\
         DTEND;VALUE=DATE:20250211\r\n\
         SUMMARY:Company Holiday\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR";

    const RECURRING_ICS: &str = "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         BEGIN:VEVENT\r\n\
         UID:standup@example.com\r\n\
         DTSTART:20250203T091500Z\r\n\
         DTEND:20250203T093000Z\r\n\
         RRULE:FREQ=DAILY\r\n\
         SUMMARY:Standup\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR";

    #[test]
    fn basic_event_inside_window() {
        let events = collect_events(BASIC_ICS, &february_window()).unwrap();

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.uid, "meeting-1@example.com");
        assert_eq!(event.summary, "Team Meeting");
        assert_eq!(event.location, "Conference Room A");
        assert_eq!(event.description, "Weekly sync");
        assert_eq!(event.start, naive(2025, 2, 5, 10, 0));
        assert_eq!(event.end, Some(naive(2025, 2, 5, 11, 0)));
        assert!(!event.recurring);
    }

    #[test]
    fn event_outside_window_is_excluded() {
        let window = TimeWindow::new(naive(2025, 3, 1, 0, 0), naive(2025, 3, 31, 0, 0));
        let events = collect_events(BASIC_ICS, &window).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn all_day_event_normalizes_to_midnight() {
        let events = collect_events(ALL_DAY_ICS, &february_window()).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start, naive(2025, 2, 10, 0, 0));
        assert_eq!(events[0].end, Some(naive(2025, 2, 11, 0, 0)));
    }

    #[test]
    fn recurring_component_expands_within_window() {
        let window = TimeWindow::new(naive(2025, 2, 10, 0, 0), naive(2025, 2, 13, 0, 0));
        let events = collect_events(RECURRING_ICS, &window).unwrap();

        assert_eq!(events.len(), 3);
        for (i, event) in events.iter().enumerate() {
            assert!(event.recurring);
            assert_eq!(event.uid, "standup@example.com");
            assert_eq!(event.start, naive(2025, 2, 10 + i as u32, 9, 15));
            // Base duration carried onto every occurrence.
            assert_eq!(event.end, Some(naive(2025, 2, 10 + i as u32, 9, 30)));
        }
    }

    #[test]
    fn missing_fields_default_to_empty_strings() {
        let ics = "BEGIN:VCALENDAR\r\n\
             BEGIN:VEVENT\r\n\
             UID:sparse@example.com\r\n\
             DTSTART:20250205T100000Z\r\n\
             END:VEVENT\r\n\
             END:VCALENDAR";
        let events = collect_events(ics, &february_window()).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "");
        assert_eq!(events[0].location, "");
        assert_eq!(events[0].description, "");
        assert!(events[0].end.is_none());
    }

    #[test]
    fn broken_component_does_not_poison_the_document() {
        // First component has an invalid rule, second is fine.
        let ics = "BEGIN:VCALENDAR\r\n\
             BEGIN:VEVENT\r\n\
             UID:broken@example.com\r\n\
             DTSTART:20250205T100000Z\r\n\
             RRULE:FREQ=NEVERLY\r\n\
             END:VEVENT\r\n\
             BEGIN:VEVENT\r\n\
             UID:fine@example.com\r\n\
             DTSTART:20250206T100000Z\r\n\
             END:VEVENT\r\n\
             END:VCALENDAR";
        let events = collect_events(ics, &february_window()).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].uid, "fine@example.com");
    }

    #[test]
    fn unparseable_document_is_an_error() {
        let result = collect_events("this is not a calendar", &february_window());
        assert!(result.is_err());
    }

    #[test]
    fn keyword_filter_applies_after_expansion() {
        let ics = "BEGIN:VCALENDAR\r\n\
             BEGIN:VEVENT\r\n\
             UID:a@example.com\r\n\
             DTSTART:20250205T100000Z\r\n\
             SUMMARY:Budget review\r\n\
             END:VEVENT\r\n\
             BEGIN:VEVENT\r\n\
             UID:b@example.com\r\n\
             DTSTART:20250206T100000Z\r\n\
             SUMMARY:Team lunch\r\n\
             END:VEVENT\r\n\
             END:VCALENDAR";

        let events = collect_events_matching(ics, "budget", &february_window()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].uid, "a@example.com");
    }
}
