//! Error handling for OCR operations.
//!
//! Errors are split into client-style problems (bad input, unsupported
//! format) and infrastructure problems (network, timeout, overload).
//! Infrastructure problems are retryable and carry a suggested delay;
//! input problems fail the unit immediately.

use std::time::Duration;

use crate::error::BoxedError;

/// Result type alias for OCR operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for OCR operations.
///
/// Carries the specific error kind plus an optional source error for
/// debugging. The kind drives retry classification in [`OcrService`].
///
/// [`OcrService`]: super::OcrService
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The specific kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error for additional context.
    #[source]
    pub source: Option<BoxedError>,
}

/// Specific kinds of OCR errors.
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    /// Authentication with the OCR service failed.
    #[error("authentication failed")]
    Authentication,

    /// The input provided to the OCR service is invalid.
    #[error("invalid input provided")]
    InvalidInput,

    /// The page format is not supported by the engine.
    #[error("unsupported image format")]
    UnsupportedImageFormat,

    /// The page exceeds the engine's size limit.
    #[error("image file is too large")]
    ImageTooLarge,

    /// Rate limit has been exceeded.
    #[error("rate limit exceeded")]
    RateLimited,

    /// A network error occurred during the request.
    #[error("network error occurred")]
    NetworkError,

    /// The operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// The OCR service is temporarily unavailable.
    #[error("service unavailable")]
    ServiceUnavailable,

    /// The OCR service is overloaded.
    #[error("service overloaded")]
    ServiceOverloaded,

    /// Failed to parse the engine's response.
    #[error("parse error")]
    ParseError,

    /// An internal engine error occurred.
    #[error("internal service error")]
    InternalError,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Creates a new error with the given kind and source error.
    pub fn with_source(kind: ErrorKind, source: BoxedError) -> Self {
        Self {
            kind,
            source: Some(source),
        }
    }

    /// Returns true if this is a client error the input must fix.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Authentication
                | ErrorKind::InvalidInput
                | ErrorKind::UnsupportedImageFormat
                | ErrorKind::ImageTooLarge
        )
    }

    /// Returns true if the operation should be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::RateLimited
                | ErrorKind::NetworkError
                | ErrorKind::Timeout
                | ErrorKind::ServiceUnavailable
                | ErrorKind::ServiceOverloaded
        )
    }

    /// Returns the suggested retry delay for retryable errors.
    pub fn retry_delay(&self) -> Option<Duration> {
        match self.kind {
            ErrorKind::RateLimited => Some(Duration::from_secs(60)),
            ErrorKind::ServiceOverloaded => Some(Duration::from_secs(30)),
            ErrorKind::ServiceUnavailable => Some(Duration::from_secs(10)),
            ErrorKind::NetworkError => Some(Duration::from_secs(5)),
            ErrorKind::Timeout => Some(Duration::from_secs(2)),
            _ => None,
        }
    }
}

// Convenience constructors for common error scenarios
impl Error {
    /// Creates an authentication error.
    pub fn authentication() -> Self {
        Self::new(ErrorKind::Authentication)
    }

    /// Creates an invalid input error.
    pub fn invalid_input() -> Self {
        Self::new(ErrorKind::InvalidInput)
    }

    /// Creates an unsupported format error.
    pub fn unsupported_format() -> Self {
        Self::new(ErrorKind::UnsupportedImageFormat)
    }

    /// Creates a rate limited error.
    pub fn rate_limited() -> Self {
        Self::new(ErrorKind::RateLimited)
    }

    /// Creates a network error.
    pub fn network_error() -> Self {
        Self::new(ErrorKind::NetworkError)
    }

    /// Creates a network error with source.
    pub fn network_error_with_source(source: BoxedError) -> Self {
        Self::with_source(ErrorKind::NetworkError, source)
    }

    /// Creates a timeout error.
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout)
    }

    /// Creates a service unavailable error.
    pub fn service_unavailable() -> Self {
        Self::new(ErrorKind::ServiceUnavailable)
    }

    /// Creates a parse error with source.
    pub fn parse_error_with_source(source: BoxedError) -> Self {
        Self::with_source(ErrorKind::ParseError, source)
    }

    /// Creates an internal error.
    pub fn internal_error() -> Self {
        Self::new(ErrorKind::InternalError)
    }

    /// Creates an internal error with source.
    pub fn internal_error_with_source(source: BoxedError) -> Self {
        Self::with_source(ErrorKind::InternalError, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(Error::timeout().is_retryable());
        assert!(Error::rate_limited().is_retryable());
        assert!(Error::service_unavailable().is_retryable());
        assert!(!Error::invalid_input().is_retryable());
        assert!(!Error::authentication().is_retryable());
    }

    #[test]
    fn test_client_error_classification() {
        assert!(Error::invalid_input().is_client_error());
        assert!(Error::unsupported_format().is_client_error());
        assert!(!Error::timeout().is_client_error());
    }

    #[test]
    fn test_retry_delay_only_for_retryable() {
        assert!(Error::timeout().retry_delay().is_some());
        assert!(Error::invalid_input().retry_delay().is_none());
    }
}
