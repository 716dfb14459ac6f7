//! CalDAV calendar source implementation.

use std::sync::Arc;

use icalendar::{Calendar, CalendarComponent};
use tracing::{debug, info, warn};
use url::Url;

use calhub_core::{Event, TimeWindow};

use crate::cache::DocumentCache;
use crate::error::SourceResult;
use crate::ics::{collect_events, collect_events_matching};
use crate::source::{BoxFuture, CalendarSource, KEYWORD_LOOKAHEAD_DAYS};

use super::client::CalDavClient;
use super::config::CalDavConfig;
use super::xml::{
    CALENDAR_QUERY_BODY, PROPFIND_CALENDARS_BODY, parse_propfind_response, parse_report_response,
};

/// Calendar source backed by a CalDAV server.
///
/// The server stores one object per event; [`CalDavSource`] enumerates them
/// with a calendar-query REPORT and synthesizes a single merged document so
/// the rest of the pipeline sees the same shape as a plain `.ics` URL.
#[derive(Debug)]
pub struct CalDavSource {
    id: String,
    client: CalDavClient,
    calendar_url: String,
    cache: Arc<DocumentCache>,
}

impl CalDavSource {
    /// Connects to the endpoint and locates the principal's calendar.
    ///
    /// Runs a PROPFIND against the configured URL and picks the first
    /// calendar-typed member; when none is advertised the URL itself is
    /// assumed to be a calendar collection. Fails when the endpoint is
    /// unreachable or rejects the credentials; callers treat that as
    /// startup-fatal.
    pub async fn connect(
        id: impl Into<String>,
        config: CalDavConfig,
        cache: Arc<DocumentCache>,
    ) -> SourceResult<Self> {
        let id = id.into();
        let base = config.url.clone();
        let client = CalDavClient::new(config)?;

        let response = client
            .propfind(base.as_str(), PROPFIND_CALENDARS_BODY, 1)
            .await
            .map_err(|e| e.with_source_name(&id))?;

        let calendars = parse_propfind_response(&response);
        let calendar_url = match calendars.first() {
            Some(calendar) => resolve_href(&base, &calendar.href),
            None => {
                debug!(url = %base, "No calendars discovered, using URL directly");
                base.to_string()
            }
        };

        info!(id = %id, calendar = %calendar_url, "Connected to CalDAV calendar");

        Ok(Self {
            id,
            client,
            calendar_url,
            cache,
        })
    }

    /// The resolved calendar collection URL.
    pub fn calendar_url(&self) -> &str {
        &self.calendar_url
    }

    /// Downloads every event object and synthesizes one merged document.
    async fn download_merged(&self) -> SourceResult<String> {
        debug!(calendar = %self.calendar_url, "Fetching events with REPORT");

        let response = self
            .client
            .report(&self.calendar_url, CALENDAR_QUERY_BODY)
            .await
            .map_err(|e| e.with_source_name(&self.id))?;

        let objects = parse_report_response(&response);
        debug!(count = objects.len(), "Received calendar objects");

        Ok(merge_documents(objects.iter().map(|(_, ics)| ics.as_str())))
    }
}

impl CalendarSource for CalDavSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> &'static str {
        "caldav"
    }

    fn fetch_document(&self) -> BoxFuture<'_, SourceResult<String>> {
        Box::pin(self.download_merged())
    }

    fn events_next_days(&self, days: u32) -> BoxFuture<'_, SourceResult<Vec<Event>>> {
        Box::pin(async move {
            let window = TimeWindow::next_days(days);
            let document = self.cache.fetch(&self.id, self.download_merged()).await?;
            collect_events(&document, &window)
        })
    }

    fn events_matching(&self, keyword: &str) -> BoxFuture<'_, SourceResult<Vec<Event>>> {
        let keyword = keyword.to_string();
        Box::pin(async move {
            let window = TimeWindow::next_days(KEYWORD_LOOKAHEAD_DAYS);
            let document = self.cache.fetch(&self.id, self.download_merged()).await?;
            collect_events_matching(&document, &keyword, &window)
        })
    }

    fn probe(&self) -> BoxFuture<'_, SourceResult<()>> {
        // A Depth-0 PROPFIND is cheaper than a full REPORT and leaves the
        // document cache untouched.
        Box::pin(async move {
            self.client
                .propfind(&self.calendar_url, PROPFIND_CALENDARS_BODY, 0)
                .await
                .map(|_| ())
        })
    }
}

/// Collects the VEVENT components of several documents under a single
/// VCALENDAR wrapper.
fn merge_documents<'a>(documents: impl Iterator<Item = &'a str>) -> String {
    let mut merged = Calendar::new();
    for ics in documents {
        let calendar: Calendar = match ics.parse() {
            Ok(calendar) => calendar,
            Err(e) => {
                warn!(error = %e, "Skipping unparseable calendar object");
                continue;
            }
        };
        for component in calendar.iter() {
            if let CalendarComponent::Event(event) = component {
                merged.push(event.clone());
            }
        }
    }
    merged.to_string()
}

/// Resolves a possibly-relative href against the configured base URL.
fn resolve_href(base: &Url, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        base.join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string())
    }
}
