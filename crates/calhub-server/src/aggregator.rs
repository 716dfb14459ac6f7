//! Best-effort fan-out across calendar sources.
//!
//! The aggregator dispatches one query to every configured source
//! concurrently and merges whatever comes back. A failing source
//! contributes nothing; it never aborts the aggregate. Each source's
//! outcome is kept as an explicit [`SourceReport`] so failures stay visible
//! to callers and tests instead of disappearing into a log line.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::warn;

use calhub_core::Event;
use calhub_sources::{CalendarSource, DocumentCache, SourceError, SourceErrorCode};

/// The operation a fan-out dispatches to every source.
#[derive(Clone, Copy)]
enum QueryOp<'a> {
    NextDays(u32),
    Matching(&'a str),
}

/// One source's contribution to an aggregate query.
#[derive(Debug)]
pub struct SourceReport {
    /// Identity of the source.
    pub source_id: String,
    /// Events the source contributed (empty on failure).
    pub events: Vec<Event>,
    /// The failure, when the source did not contribute.
    pub error: Option<SourceError>,
}

/// All per-source outcomes of one aggregate query, in configuration order.
#[derive(Debug)]
pub struct AggregateOutcome {
    /// One report per configured source.
    pub reports: Vec<SourceReport>,
}

impl AggregateOutcome {
    /// Merges every contribution into a single list, stably sorted
    /// ascending by start time. Equal timestamps keep configuration order.
    pub fn into_events(self) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .reports
            .into_iter()
            .flat_map(|report| report.events)
            .collect();
        events.sort_by(|a, b| a.start.cmp(&b.start));
        events
    }

    /// Reports of sources that failed this query.
    pub fn failures(&self) -> impl Iterator<Item = &SourceReport> {
        self.reports.iter().filter(|report| report.error.is_some())
    }
}

/// Fans queries out across every configured source.
pub struct Aggregator {
    sources: Vec<Arc<dyn CalendarSource>>,
    cache: Arc<DocumentCache>,
}

impl Aggregator {
    /// Creates an aggregator over the given sources and document cache.
    pub fn new(sources: Vec<Arc<dyn CalendarSource>>, cache: Arc<DocumentCache>) -> Self {
        Self { sources, cache }
    }

    /// The configured sources, in configuration order.
    pub fn sources(&self) -> &[Arc<dyn CalendarSource>] {
        &self.sources
    }

    /// The shared document cache.
    pub fn cache(&self) -> &Arc<DocumentCache> {
        &self.cache
    }

    /// Queries every source for events in the next `days` days.
    pub async fn query_next_days(&self, days: u32) -> AggregateOutcome {
        self.gather(QueryOp::NextDays(days)).await
    }

    /// Queries every source for events matching `keyword`.
    ///
    /// Sources without the keyword capability are skipped with a warning;
    /// the skip shows up as an [`SourceErrorCode::UnsupportedCapability`]
    /// report entry.
    pub async fn query_matching(&self, keyword: &str) -> AggregateOutcome {
        self.gather(QueryOp::Matching(keyword)).await
    }

    /// Merged, sorted events for the next `days` days.
    pub async fn events_next_days(&self, days: u32) -> Vec<Event> {
        self.query_next_days(days).await.into_events()
    }

    /// Merged, sorted events matching `keyword`.
    pub async fn events_matching(&self, keyword: &str) -> Vec<Event> {
        self.query_matching(keyword).await.into_events()
    }

    /// Runs `op` on every source concurrently and wraps each result in a
    /// report. Per-source failures are logged and contained here; nothing
    /// propagates.
    async fn gather(&self, op: QueryOp<'_>) -> AggregateOutcome {
        let tasks = self.sources.iter().map(|source| {
            let id = source.id().to_string();
            let fut = match op {
                QueryOp::NextDays(days) => source.events_next_days(days),
                QueryOp::Matching(keyword) => source.events_matching(keyword),
            };
            async move { (id, fut.await) }
        });

        let reports = join_all(tasks)
            .await
            .into_iter()
            .map(|(source_id, result)| match result {
                Ok(events) => SourceReport {
                    source_id,
                    events,
                    error: None,
                },
                Err(error) => {
                    if error.code() == SourceErrorCode::UnsupportedCapability {
                        warn!(source = %source_id, "Source skipped: {error}");
                    } else {
                        warn!(source = %source_id, error = %error, "Source query failed");
                    }
                    SourceReport {
                        source_id,
                        events: Vec::new(),
                        error: Some(error),
                    }
                }
            })
            .collect();

        AggregateOutcome { reports }
    }
}
