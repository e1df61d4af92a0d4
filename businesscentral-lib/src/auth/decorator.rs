//! Request decoration hook.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::header::HeaderValue;

use super::TokenProvider;
use crate::error::AuthError;
use crate::transport::HttpRequest;

/// Adjusts every outbound request before it is sent.
///
/// The client calls the decorator once per logical request, before retries.
/// Typical use is attaching credentials.
#[async_trait]
pub trait RequestDecorator: Send + Sync {
    /// Modifies the request in place.
    async fn decorate(&self, request: &mut HttpRequest) -> Result<(), AuthError>;
}

/// Leaves requests untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDecoration;

#[async_trait]
impl RequestDecorator for NoDecoration {
    async fn decorate(&self, _request: &mut HttpRequest) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Sets `Authorization: Bearer <token>` from a [`TokenProvider`].
pub struct BearerAuth {
    provider: Arc<dyn TokenProvider>,
    resource: String,
}

impl BearerAuth {
    /// Creates a decorator requesting tokens for `resource`.
    pub fn new(provider: impl TokenProvider + 'static, resource: impl Into<String>) -> Self {
        Self {
            provider: Arc::new(provider),
            resource: resource.into(),
        }
    }

    /// Creates a decorator from a shared provider.
    pub fn from_arc(provider: Arc<dyn TokenProvider>, resource: impl Into<String>) -> Self {
        Self {
            provider,
            resource: resource.into(),
        }
    }
}

#[async_trait]
impl RequestDecorator for BearerAuth {
    async fn decorate(&self, request: &mut HttpRequest) -> Result<(), AuthError> {
        let token = self.provider.get_token(&self.resource).await?;
        let value = HeaderValue::from_str(&token.as_bearer())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        request.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}
