//! Error types for calendar source operations.

use std::fmt;
use thiserror::Error;

/// The category of a source error.
///
/// Categories drive the aggregator's per-source handling: connectivity and
/// authentication failures empty that source's contribution, an unsupported
/// capability is skipped with a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceErrorCode {
    /// Credentials were rejected by the remote endpoint.
    AuthenticationFailed,
    /// The endpoint could not be reached at the transport level.
    ConnectionFailed,
    /// The remote answered with a non-success status.
    FetchFailed,
    /// The fetched document could not be parsed.
    InvalidDocument,
    /// The source does not implement the requested operation.
    UnsupportedCapability,
}

impl SourceErrorCode {
    /// Returns a stable snake_case name for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::ConnectionFailed => "connection_failed",
            Self::FetchFailed => "fetch_failed",
            Self::InvalidDocument => "invalid_document",
            Self::UnsupportedCapability => "unsupported_capability",
        }
    }
}

impl fmt::Display for SourceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised while interacting with a calendar source.
#[derive(Debug, Error)]
pub struct SourceError {
    /// The error code categorizing this error.
    code: SourceErrorCode,
    /// A human-readable message.
    message: String,
    /// Identity of the source that produced the error, when known.
    source_name: Option<String>,
    /// The underlying cause, if any.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SourceError {
    /// Creates a new error with the given code and message.
    pub fn new(code: SourceErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source_name: None,
            source: None,
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::AuthenticationFailed, message)
    }

    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::ConnectionFailed, message)
    }

    /// Creates a fetch error (non-success remote status).
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::FetchFailed, message)
    }

    /// Creates an invalid document error.
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::InvalidDocument, message)
    }

    /// Creates an unsupported capability error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::UnsupportedCapability, message)
    }

    /// Sets the source identity for this error.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Sets the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> SourceErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the source identity, if set.
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref name) = self.source_name {
            write!(f, "[{}] ", name)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_names() {
        assert_eq!(
            SourceErrorCode::AuthenticationFailed.as_str(),
            "authentication_failed"
        );
        assert_eq!(
            SourceErrorCode::UnsupportedCapability.as_str(),
            "unsupported_capability"
        );
    }

    #[test]
    fn constructor_helpers() {
        let err = SourceError::fetch("status 404");
        assert_eq!(err.code(), SourceErrorCode::FetchFailed);
        assert_eq!(err.message(), "status 404");
        assert!(err.source_name().is_none());
    }

    #[test]
    fn display_includes_source_name() {
        let err = SourceError::connection("timed out").with_source_name("caldav-1");
        let rendered = format!("{}", err);
        assert!(rendered.contains("[caldav-1]"));
        assert!(rendered.contains("connection_failed"));
        assert!(rendered.contains("timed out"));
    }

    #[test]
    fn cause_is_preserved() {
        use std::error::Error;
        let io = std::io::Error::other("broken pipe");
        let err = SourceError::connection("request failed").with_source(io);
        assert!(err.source().is_some());
    }
}
