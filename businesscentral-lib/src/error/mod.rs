//! Error types

mod api;
mod auth;
mod detail;
mod query;
mod transport;

pub use api::*;
pub use auth::*;
pub use detail::*;
pub use query::*;
pub use transport::*;

/// Top-level error returned by client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The query or predicate could not be built.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The request never produced a usable HTTP response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service answered with a non-success status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request decorator failed to prepare the request.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A success response body could not be decoded.
    #[error("Response decode error: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
        /// Raw response body.
        body: Option<String>,
    },

    /// A request body could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A URL could not be parsed or joined.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Creates a decode error carrying the offending body.
    pub fn decode(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            body: Some(body.into()),
        }
    }

    /// Returns the HTTP status code if the service answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api(e) => Some(e.status),
            _ => None,
        }
    }

    /// Returns `true` if this failure class is transient.
    ///
    /// Only transport failures are ever retried. An API error with a 5xx
    /// status has already been through the retry policy by the time it
    /// reaches the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_transient(),
            _ => false,
        }
    }
}
