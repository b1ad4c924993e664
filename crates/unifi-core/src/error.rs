//! Error types for Site Manager operations.
//!
//! Two kinds of failure reach callers. [`Error::Validation`] is raised locally
//! and synchronously, before anything touches the network. [`Error::Api`] wraps
//! an [`ApiError`], the single kind produced by the request executor for every
//! execution failure, whatever its cause.

use std::time::Duration;
use thiserror::Error;

/// Main error type for Site Manager operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid input rejected before any request was issued
    #[error("Validation error: {0}")]
    Validation(String),

    /// A request was issued and failed
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Execution failure surfaced by the request executor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Non-success HTTP status, including an authentication failure that
    /// persisted after the session was refreshed
    #[error("API request failed: {status}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body, as far as it could be read
        body: String,
    },

    /// The request did not complete within the configured timeout
    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Connection, DNS, TLS or other transport failure
    #[error("Request failed: {0}")]
    Transport(String),

    /// Successful status but the body was not valid JSON
    #[error("Invalid JSON response from API: {0}")]
    Decode(String),
}

/// Specialized result type for Site Manager operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Api(api) => api.error_code(),
        }
    }

    /// Returns true if the error was raised locally, before any request.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns the HTTP status code carried by the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api(ApiError::Http { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

impl ApiError {
    /// Returns the error code for this execution failure.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Http { .. } => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
        }
    }

    /// Returns true for 401 and 403 responses.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Http { status: 401 | 403, .. })
    }
}

// Conversions from external error types
impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::Validation(format!("Invalid URL: {err}"))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(format!("Invalid configuration: {err}"))
    }
}
