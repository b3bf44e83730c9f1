//! Error types for the scanrelay library.
//!
//! Every failure that can end a single file's run is a `ScanError`. The batch
//! driver catches them per file, so none of these abort a whole run.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for scan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// An I/O error occurred while reading an input file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found at the specified path.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: String,
    },

    /// The request never produced a response (DNS, TLS, connect, timeout...).
    #[error("request to '{endpoint}' failed: {message}")]
    ConnectionFailed {
        /// Endpoint name (`query` or `upload`).
        endpoint: String,
        /// Error message describing the failure.
        message: String,
    },

    /// The appliance answered with something that is not a scan response.
    #[error("ambiguous response from '{endpoint}': {details}")]
    AmbiguousResponse {
        /// Endpoint name (`query` or `upload`).
        endpoint: String,
        /// Details about the ambiguity.
        details: String,
    },

    /// Writing the result file failed.
    #[error("failed to write result to {}: {source}", path.display())]
    WriteFailed {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An internal error occurred.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl ScanError {
    /// Returns `true` if the error came from talking to the appliance.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::AmbiguousResponse { .. }
        )
    }

    /// Returns the endpoint name if this error is associated with one.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::ConnectionFailed { endpoint, .. } | Self::AmbiguousResponse { endpoint, .. } => {
                Some(endpoint)
            }
            _ => None,
        }
    }

    /// Creates a `ConnectionFailed` error.
    pub fn connection_failed(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Creates an `AmbiguousResponse` error.
    pub fn ambiguous(endpoint: impl Into<String>, details: impl Into<String>) -> Self {
        Self::AmbiguousResponse {
            endpoint: endpoint.into(),
            details: details.into(),
        }
    }

    /// Creates an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// A specialized `Result` type for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_is_remote() {
        let err = ScanError::connection_failed("upload", "connection reset");
        assert!(err.is_remote());

        let missing = ScanError::FileNotFound {
            path: "/nope".into(),
        };
        assert!(!missing.is_remote());
    }

    #[test]
    fn test_scan_error_endpoint() {
        let err = ScanError::ambiguous("query", "missing status label");
        assert_eq!(err.endpoint(), Some("query"));

        let io_err = ScanError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "test error",
        ));
        assert_eq!(io_err.endpoint(), None);
    }

    #[test]
    fn test_write_failed_display() {
        let err = ScanError::WriteFailed {
            path: PathBuf::from("/out/a.txt.response.txt"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("a.txt.response.txt"));
        assert!(msg.contains("denied"));
    }
}
