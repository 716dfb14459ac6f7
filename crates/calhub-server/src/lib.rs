//! Aggregation service: fan-out, health, configuration, HTTP surface.
//!
//! This crate wires the source layer into a running read-only service:
//!
//! - [`Aggregator`] - concurrent best-effort fan-out with per-source reports
//! - [`HealthChecker`] - cache-independent reachability probing
//! - [`ServiceConfig`] - environment-driven, parsed once at startup
//! - [`router`] - the axum HTTP adapter (`/health`, `/events/next/{days}`)

pub mod aggregator;
pub mod config;
pub mod error;
pub mod health;
pub mod http;

pub use aggregator::{AggregateOutcome, Aggregator, SourceReport};
pub use config::{ConfigError, ServiceConfig, SourceDescriptor, build_sources};
pub use error::{ServerError, ServerResult};
pub use health::HealthChecker;
pub use http::{ApiError, AppState, router};
