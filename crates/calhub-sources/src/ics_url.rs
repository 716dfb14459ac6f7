//! Plain ICS document URL source.
//!
//! The simplest backend: the calendar is a single `.ics` document behind an
//! HTTP URL. One GET returns the whole raw document.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;
use url::Url;

use calhub_core::{Event, TimeWindow};

use crate::cache::DocumentCache;
use crate::error::{SourceError, SourceResult};
use crate::ics::{collect_events, collect_events_matching};
use crate::source::{BoxFuture, CalendarSource, KEYWORD_LOOKAHEAD_DAYS};

/// Calendar source backed by a plain `.ics` document URL.
pub struct IcsUrlSource {
    id: String,
    url: Url,
    client: Client,
    cache: Arc<DocumentCache>,
}

impl IcsUrlSource {
    /// Default request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a source for the given document URL.
    pub fn new(id: impl Into<String>, url: Url, cache: Arc<DocumentCache>) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS))
            .user_agent(format!("calhub/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::connection(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            id: id.into(),
            url,
            client,
            cache,
        })
    }

    /// The configured document URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn download(&self) -> SourceResult<String> {
        debug!(url = %self.url, "Fetching calendar document");

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| {
                SourceError::connection(format!("request to {} failed: {e}", self.url))
                    .with_source_name(&self.id)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::fetch(format!(
                "failed to retrieve document from {}: status {status}",
                self.url
            ))
            .with_source_name(&self.id));
        }

        response.text().await.map_err(|e| {
            SourceError::connection(format!("failed to read document body: {e}"))
                .with_source_name(&self.id)
        })
    }
}

impl CalendarSource for IcsUrlSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> &'static str {
        "ics"
    }

    fn fetch_document(&self) -> BoxFuture<'_, SourceResult<String>> {
        Box::pin(self.download())
    }

    fn events_next_days(&self, days: u32) -> BoxFuture<'_, SourceResult<Vec<Event>>> {
        Box::pin(async move {
            let window = TimeWindow::next_days(days);
            let document = self.cache.fetch(&self.id, self.download()).await?;
            collect_events(&document, &window)
        })
    }

    fn events_matching(&self, keyword: &str) -> BoxFuture<'_, SourceResult<Vec<Event>>> {
        let keyword = keyword.to_string();
        Box::pin(async move {
            let window = TimeWindow::next_days(KEYWORD_LOOKAHEAD_DAYS);
            let document = self.cache.fetch(&self.id, self.download()).await?;
            collect_events_matching(&document, &keyword, &window)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceErrorCode;
    use chrono::{Duration as ChronoDuration, Utc};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cache() -> Arc<DocumentCache> {
        Arc::new(DocumentCache::new(Duration::from_secs(60), 10))
    }

    fn source_for(server: &MockServer, cache: Arc<DocumentCache>) -> IcsUrlSource {
        let url = Url::parse(&format!("{}/calendar.ics", server.uri())).unwrap();
        IcsUrlSource::new("ics-1", url, cache).unwrap()
    }

    /// A document with one timed event starting tomorrow.
    fn ics_event_tomorrow() -> String {
        let start = Utc::now() + ChronoDuration::days(1);
        let end = start + ChronoDuration::hours(1);
        format!(
            "BEGIN:VCALENDAR\r\n\
             VERSION:2.0\r\n\
             BEGIN:VEVENT\r\n\
             UID:tomorrow@example.com\r\n\
             DTSTART:{}\r\n\
             DTEND:{}\r\n\
             SUMMARY:Planning\r\n\
             END:VEVENT\r\n\
             END:VCALENDAR",
            start.format("%Y%m%dT%H%M%SZ"),
            end.format("%Y%m%dT%H%M%SZ"),
        )
    }

    /// A document with one all-day event tomorrow.
    fn ics_all_day_tomorrow() -> String {
        let date = (Utc::now() + ChronoDuration::days(1)).date_naive();
        format!(
            "BEGIN:VCALENDAR\r\n\
             VERSION:2.0\r\n\
             BEGIN:VEVENT\r\n\
             UID:allday@example.com\r\n\
             DTSTART;VALUE=DATE:{}\r\n\
             SUMMARY:Offsite\r\n\
             END:VEVENT\r\n\
             END:VCALENDAR",
            date.format("%Y%m%d"),
        )
    }

    #[tokio::test]
    async fn single_event_tomorrow_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendar.ics"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ics_event_tomorrow()))
            .mount(&server)
            .await;

        let source = source_for(&server, cache());
        let events = source.events_next_days(3).await.unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].uid, "tomorrow@example.com");
        assert!(!events[0].recurring);
    }

    #[tokio::test]
    async fn all_day_event_tomorrow_is_included_at_midnight() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendar.ics"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ics_all_day_tomorrow()))
            .mount(&server)
            .await;

        let source = source_for(&server, cache());
        let events = source.events_next_days(1).await.unwrap();

        assert_eq!(events.len(), 1);
        let expected_midnight = (Utc::now() + ChronoDuration::days(1))
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(events[0].start, expected_midnight);
    }

    #[tokio::test]
    async fn daily_rule_anchored_yesterday_expands_to_two_occurrences() {
        // Anchor just over a day ago so neither window bound sits exactly
        // on an occurrence.
        let anchor = Utc::now() - ChronoDuration::hours(24) - ChronoDuration::minutes(5);
        let ics = format!(
            "BEGIN:VCALENDAR\r\n\
             VERSION:2.0\r\n\
             BEGIN:VEVENT\r\n\
             UID:daily@example.com\r\n\
             DTSTART:{}\r\n\
             DTEND:{}\r\n\
             RRULE:FREQ=DAILY\r\n\
             SUMMARY:Standup\r\n\
             END:VEVENT\r\n\
             END:VCALENDAR",
            anchor.format("%Y%m%dT%H%M%SZ"),
            (anchor + ChronoDuration::minutes(30)).format("%Y%m%dT%H%M%SZ"),
        );

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendar.ics"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ics))
            .mount(&server)
            .await;

        let source = source_for(&server, cache());
        let events = source.events_next_days(2).await.unwrap();

        assert_eq!(events.len(), 2);
        for event in &events {
            assert!(event.recurring);
            assert_eq!(
                event.end.unwrap() - event.start,
                ChronoDuration::minutes(30)
            );
        }
    }

    #[tokio::test]
    async fn repeat_query_within_ttl_hits_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendar.ics"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ics_event_tomorrow()))
            .mount(&server)
            .await;

        let source = source_for(&server, cache());
        source.events_next_days(3).await.unwrap();
        source.events_next_days(3).await.unwrap();

        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn expired_ttl_triggers_exactly_one_refetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendar.ics"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ics_event_tomorrow()))
            .mount(&server)
            .await;

        let short_cache = Arc::new(DocumentCache::new(Duration::from_millis(20), 10));
        let source = source_for(&server, short_cache);

        source.events_next_days(3).await.unwrap();
        source.events_next_days(3).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        source.events_next_days(3).await.unwrap();

        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn non_success_status_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendar.ics"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = source_for(&server, cache());
        let err = source.events_next_days(3).await.unwrap_err();
        assert_eq!(err.code(), SourceErrorCode::FetchFailed);
    }

    #[tokio::test]
    async fn probe_does_not_populate_the_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendar.ics"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ics_event_tomorrow()))
            .mount(&server)
            .await;

        let shared = cache();
        let source = source_for(&server, shared.clone());

        source.probe().await.unwrap();
        assert!(shared.is_empty().await);
    }

    #[tokio::test]
    async fn keyword_search_filters_events() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendar.ics"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ics_event_tomorrow()))
            .mount(&server)
            .await;

        let source = source_for(&server, cache());

        let hits = source.events_matching("planning").await.unwrap();
        assert_eq!(hits.len(), 1);

        let misses = source.events_matching("retro").await.unwrap();
        assert!(misses.is_empty());
    }
}
