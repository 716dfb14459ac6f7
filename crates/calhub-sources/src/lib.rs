//! Calendar source abstraction and implementations.
//!
//! This crate provides the backend layer of calhub:
//!
//! - [`CalendarSource`] - the capability interface every backend implements
//! - [`CalDavSource`] - CalDAV (RFC 4791) servers, Basic-authenticated
//! - [`IcsUrlSource`] - plain `.ics` documents behind a URL
//! - [`DocumentCache`] - TTL + LRU memoization of raw document fetches
//! - [`SourceError`] - the error taxonomy shared by all backends
//!
//! Both backends produce the same thing: a raw iCalendar document, fed
//! through one parsing/windowing pipeline ([`collect_events`]). The
//! difference between them is only how the document is obtained.

pub mod cache;
pub mod caldav;
pub mod error;
pub mod ics;
pub mod ics_url;
pub mod source;

pub use cache::DocumentCache;
pub use caldav::{CalDavClient, CalDavConfig, CalDavSource};
pub use error::{SourceError, SourceErrorCode, SourceResult};
pub use ics::{collect_events, collect_events_matching};
pub use ics_url::IcsUrlSource;
pub use source::{BoxFuture, CalendarSource, KEYWORD_LOOKAHEAD_DAYS};
