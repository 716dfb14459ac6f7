//! CalendarSource trait definition.
//!
//! [`CalendarSource`] is the capability interface implemented by every
//! calendar backend. It replaces duck-typed method probing with an explicit
//! contract: a backend that lacks an operation reports
//! [`SourceErrorCode::UnsupportedCapability`](crate::error::SourceErrorCode)
//! instead of being silently skipped.

use std::future::Future;
use std::pin::Pin;

use calhub_core::Event;

use crate::error::{SourceError, SourceResult};

/// Lookahead for keyword queries, which carry no window of their own.
pub const KEYWORD_LOOKAHEAD_DAYS: u32 = 365;

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The capability interface for a single calendar backend.
///
/// Implementations must be `Send + Sync`; the aggregator fans out over
/// `Arc<dyn CalendarSource>` handles concurrently. All operations are
/// read-only and idempotent.
pub trait CalendarSource: Send + Sync {
    /// Stable identity of this source. Used as the document cache key and
    /// as the key in health responses.
    fn id(&self) -> &str;

    /// Backend kind, e.g. `"caldav"` or `"ics"`.
    fn kind(&self) -> &'static str;

    /// Fetches the raw calendar document directly from the backend,
    /// bypassing the document cache.
    fn fetch_document(&self) -> BoxFuture<'_, SourceResult<String>>;

    /// Events whose start falls within `[now, now + days]`, both bounds
    /// inclusive. Recurring components are expanded into one event per
    /// occurrence inside the window.
    ///
    /// `days` must be positive; enforcing that is the caller's contract.
    fn events_next_days(&self, days: u32) -> BoxFuture<'_, SourceResult<Vec<Event>>>;

    /// Events matching `keyword` within the next
    /// [`KEYWORD_LOOKAHEAD_DAYS`] days.
    ///
    /// The default implementation reports the capability as unsupported.
    fn events_matching(&self, _keyword: &str) -> BoxFuture<'_, SourceResult<Vec<Event>>> {
        let err = SourceError::unsupported("keyword search is not supported by this source")
            .with_source_name(self.id());
        Box::pin(async move { Err(err) })
    }

    /// Lightweight reachability probe. Must not consult or mutate the
    /// document cache.
    ///
    /// The default implementation fetches the document directly and
    /// discards it; backends with a cheaper probe should override.
    fn probe(&self) -> BoxFuture<'_, SourceResult<()>> {
        Box::pin(async move { self.fetch_document().await.map(|_| ()) })
    }
}
