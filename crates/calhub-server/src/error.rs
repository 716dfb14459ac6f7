//! Server error types.

use thiserror::Error;

/// Result type for server startup and runtime operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can take the service down.
///
/// Per-source query errors never reach this type; the aggregator contains
/// them. What remains is startup failure (configuration, source
/// construction) and transport-level listener errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (listener bind, serve loop).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed or left no usable source.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// A source failed to construct at startup.
    #[error(transparent)]
    Source(#[from] calhub_sources::SourceError),

    /// Tracing initialization failed.
    #[error(transparent)]
    Tracing(#[from] calhub_core::TracingError),
}
