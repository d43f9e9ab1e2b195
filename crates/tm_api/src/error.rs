//! Error model used by test-management client operations.

use std::io;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TmError>;

/// Represents failures of a service call. Transport failures (network, timeout, local I/O) abort the
/// call; rejections carry the attempted operation, the HTTP status and the remote reason so callers can branch.
#[derive(Debug, Error)]
pub enum TmError {
    #[error("{operation} rejected with http {status}: {reason}")]
    Rejected {
        operation: &'static str,
        status: StatusCode,
        reason: String,
    },
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected error: {0}")]
    Other(String),
}

impl TmError {
    /// Constructs a rejection for an operation answered with an unexpected status code.
    pub fn rejected(operation: &'static str, status: StatusCode, reason: impl Into<String>) -> Self {
        TmError::Rejected {
            operation,
            status,
            reason: reason.into(),
        }
    }

    /// True for failures below the HTTP layer, which are fatal to the call.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            TmError::Timeout(_) | TmError::Network(_) | TmError::Io(_) | TmError::Other(_)
        )
    }

    /// Returns the HTTP status of a rejection.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TmError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TmError {
    /// Converts reqwest errors into semantic TmError variants.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TmError::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() || err.is_body() {
            TmError::Network(err.to_string())
        } else if err.is_decode() {
            TmError::Serialization(err.to_string())
        } else {
            TmError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TmError {
    /// Converts serde_json decode/encode failures into serialization errors.
    fn from(err: serde_json::Error) -> Self {
        TmError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::TmError;
    use reqwest::StatusCode;

    #[test]
    fn rejection_is_not_a_transport_failure() {
        let err = TmError::rejected("update test status", StatusCode::NOT_FOUND, "Not Found");
        assert!(!err.is_transport());
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(
            err.to_string(),
            "update test status rejected with http 404 Not Found: Not Found"
        );
    }

    #[test]
    fn network_failure_is_transport() {
        let err = TmError::Network("connection refused".to_string());
        assert!(err.is_transport());
        assert!(err.status().is_none());
    }

    #[test]
    fn json_errors_become_serialization_failures() {
        let err: TmError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, TmError::Serialization(_)));
        assert!(!err.is_transport());
    }
}
