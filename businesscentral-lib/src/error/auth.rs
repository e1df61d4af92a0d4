//! Authentication error types

/// Errors raised by a request decorator while preparing a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No usable token could be obtained.
    #[error("Token unavailable: {message}")]
    TokenUnavailable { message: String },

    /// The token could not be turned into a header value.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Any other decorator failure.
    #[error("Request decoration failed: {0}")]
    Other(String),
}
