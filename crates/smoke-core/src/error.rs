//! Error types for the smoke runner.
//!
//! Request-level failures inside a check never surface here: suites turn them
//! into failed outcomes. These variants cover setup and I/O around a run.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the smoke runner.
#[derive(Debug, Error)]
pub enum SmokeError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Configuration errors
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Unknown suite: {0}")]
    UnknownSuite(String),

    #[error("Run cancelled")]
    Cancelled,
}

/// Result type alias for smoke runner operations.
pub type Result<T> = std::result::Result<T, SmokeError>;

impl From<std::io::Error> for SmokeError {
    fn from(err: std::io::Error) -> Self {
        SmokeError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for SmokeError {
    fn from(err: serde_json::Error) -> Self {
        SmokeError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// A bare `reqwest::Error` does not carry the budget it ran out of, so
/// timeouts land in `Network` here. `HttpClient` maps them to `Timeout`.
impl From<reqwest::Error> for SmokeError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("Request timed out: {}", err)
        } else {
            err.to_string()
        };
        SmokeError::Network {
            message,
            cause: std::error::Error::source(&err).map(|s| s.to_string()),
        }
    }
}

impl From<url::ParseError> for SmokeError {
    fn from(err: url::ParseError) -> Self {
        SmokeError::InvalidUrl {
            url: String::new(),
            message: err.to_string(),
        }
    }
}

impl SmokeError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        SmokeError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Whether the error came from the transport rather than from local setup.
    pub fn is_transport(&self) -> bool {
        matches!(self, SmokeError::Network { .. } | SmokeError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SmokeError::UnknownSuite("phase9".into());
        assert_eq!(err.to_string(), "Unknown suite: phase9");

        let err = SmokeError::InvalidUrl {
            url: "ftp://x".into(),
            message: "unsupported scheme".into(),
        };
        assert_eq!(err.to_string(), "Invalid URL ftp://x: unsupported scheme");
    }

    #[test]
    fn test_transport_errors() {
        assert!(SmokeError::Timeout(std::time::Duration::from_secs(10)).is_transport());
        assert!(SmokeError::Network {
            message: "connection refused".into(),
            cause: None,
        }
        .is_transport());
        assert!(!SmokeError::Cancelled.is_transport());
    }

    #[test]
    fn test_json_conversion() {
        let err: SmokeError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, SmokeError::Json { .. }));
    }
}
