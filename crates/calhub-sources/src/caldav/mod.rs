//! CalDAV calendar source.
//!
//! Read-only access to CalDAV (RFC 4791) calendar collections:
//!
//! - [`CalDavConfig`] - endpoint URL and credentials
//! - [`CalDavClient`] - the WebDAV verbs (PROPFIND, REPORT) over reqwest
//! - [`CalDavSource`] - discovery, merged-document synthesis, and the
//!   [`CalendarSource`](crate::source::CalendarSource) implementation
//!
//! The fetched document is window-independent: the REPORT enumerates every
//! VEVENT, and the query window is applied after parsing. That lets one
//! cached document serve queries of any length.

mod client;
mod config;
mod source;
mod xml;

pub use client::CalDavClient;
pub use config::CalDavConfig;
pub use source::CalDavSource;
pub use xml::{DiscoveredCalendar, parse_propfind_response, parse_report_response};
