//! TokenProvider trait and AccessToken

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::error::AuthError;

/// A bearer access token with optional expiration.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The bearer token sent with each request.
    pub access_token: String,
    /// When the token expires, if known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Creates a token with unknown expiry.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    /// Creates a token with an expiration time.
    pub fn with_expiry(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: Some(expires_at),
        }
    }

    /// Returns `true` if the token has expired.
    ///
    /// Returns `false` if expiration time is unknown.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Utc::now() >= exp)
    }

    /// Returns the token as a bearer authorization header value.
    pub fn as_bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Supplies access tokens to [`BearerAuth`](super::BearerAuth).
///
/// Token acquisition (client credentials, device code, ...) lives outside
/// this crate. Implementations should cache tokens and refresh them
/// transparently; `get_token` is called once per logical request.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use businesscentral_lib::auth::{AccessToken, TokenProvider};
/// use businesscentral_lib::error::AuthError;
///
/// struct FromVault { /* ... */ }
///
/// #[async_trait]
/// impl TokenProvider for FromVault {
///     async fn get_token(&self, resource: &str) -> Result<AccessToken, AuthError> {
///         let secret = self.fetch(resource).await.map_err(|e| AuthError::TokenUnavailable {
///             message: e.to_string(),
///         })?;
///         Ok(AccessToken::new(secret))
///     }
/// }
/// ```
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Gets an access token for the given service root URL.
    async fn get_token(&self, resource: &str) -> Result<AccessToken, AuthError>;
}

/// A token provider that always returns the same token.
///
/// # Example
///
/// ```
/// use businesscentral_lib::auth::StaticTokenProvider;
///
/// let provider = StaticTokenProvider::new("my-access-token");
/// ```
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    /// Creates a provider for the given token string.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(access_token),
        }
    }

    /// Creates a provider from an existing token.
    pub fn from_token(token: AccessToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self, _resource: &str) -> Result<AccessToken, AuthError> {
        if self.token.is_expired() {
            return Err(AuthError::TokenUnavailable {
                message: "static token has expired".to_string(),
            });
        }
        Ok(self.token.clone())
    }
}
