//! Core types: events, canonical time, recurrence expansion.
//!
//! This crate holds the pure, I/O-free heart of calhub:
//!
//! - [`Event`] - the aggregated event value type
//! - [`normalize`] / [`TimeWindow`] - canonical time handling
//! - [`expand`] - bounded recurrence expansion
//! - [`init_tracing`] - shared tracing setup for the binaries

pub mod event;
pub mod recurrence;
pub mod time;
pub mod tracing;

pub use event::Event;
pub use recurrence::{Occurrence, RecurrenceError, expand};
pub use time::{TemporalValue, TimeError, TimeWindow, normalize};
pub use tracing::{TracingConfig, TracingError, TracingFormat, init_tracing};
