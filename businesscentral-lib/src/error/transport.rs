//! Transport error types

use std::time::Duration;

/// Failures below the HTTP response level.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The request timed out.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Any other network-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The circuit breaker is open and the call was not attempted.
    #[error("Circuit open, retry after {retry_after:?}")]
    CircuitOpen {
        /// Remaining cool-down before a probe call is allowed.
        retry_after: Duration,
    },
}

impl TransportError {
    /// Returns `true` for failures the retry policy handles.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::CircuitOpen { .. })
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
