//! API error types

use super::ApiErrorDetail;

/// A non-success response from the service.
///
/// Always surfaced to the caller. The structured detail is present only when
/// the error body could be parsed.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Structured error detail, if the body was parseable.
    pub detail: Option<ApiErrorDetail>,
    /// Raw response body.
    pub body: String,
}

impl ApiError {
    /// Creates an error with no structured detail.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            detail: None,
            body: body.into(),
        }
    }

    /// Creates an error with structured detail.
    pub fn with_detail(status: u16, detail: ApiErrorDetail, body: impl Into<String>) -> Self {
        Self {
            status,
            detail: Some(detail),
            body: body.into(),
        }
    }

    /// Returns the protocol error code if available.
    pub fn error_code(&self) -> Option<&str> {
        self.detail.as_ref().map(|d| d.code.as_str())
    }

    /// Returns the protocol error message if available.
    pub fn message(&self) -> Option<&str> {
        self.detail.as_ref().map(|d| d.message.as_str())
    }

    /// Returns `true` for 5xx statuses.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "HTTP {}: {}", self.status, detail),
            None if self.body.is_empty() => write!(f, "HTTP {}", self.status),
            None => write!(f, "HTTP {}: {}", self.status, self.body),
        }
    }
}

impl std::error::Error for ApiError {}
