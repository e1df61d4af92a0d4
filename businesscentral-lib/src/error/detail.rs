//! Structured service error payload

use serde::Deserialize;

/// Structured error information from an error envelope.
///
/// The service reports failures as `{ "error": { "code", "message" } }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorDetail {
    /// The protocol error code (e.g., "BadRequest_NotFound").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ApiErrorDetail {
    /// Creates a new error detail with the given code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ApiErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
