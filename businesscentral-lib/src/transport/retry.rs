//! Retry configuration for transient failures.

use std::time::Duration;

use super::HttpResponse;
use crate::error::TransportError;

/// Configuration for automatic retry behavior.
///
/// Transient failures are 5xx responses, request timeouts (including HTTP
/// 408) and connection-level failures. The delay before retry `n` is
/// `base_delay * 2^n`.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use businesscentral_lib::transport::RetryConfig;
///
/// // Default configuration: 3 retries after 2s, 4s and 8s
/// let config = RetryConfig::default();
///
/// // Custom configuration
/// let custom = RetryConfig::default()
///     .max_retries(5)
///     .base_delay(Duration::from_millis(250));
///
/// // Disable all retries
/// let no_retry = RetryConfig::no_retry();
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Base of the exponential backoff.
    pub base_delay: Duration,
    /// Whether to retry on HTTP 5xx.
    pub retry_on_5xx: bool,
    /// Whether to retry on timeouts (client-side or HTTP 408).
    pub retry_on_timeout: bool,
    /// Whether to retry on connection and other network failures.
    pub retry_on_network: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            retry_on_5xx: true,
            retry_on_timeout: true,
            retry_on_network: true,
        }
    }
}

impl RetryConfig {
    /// Creates a config with all retries disabled.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            retry_on_5xx: false,
            retry_on_timeout: false,
            retry_on_network: false,
            ..Default::default()
        }
    }

    /// Sets the maximum number of retries.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Sets the backoff base.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Enables or disables retry on HTTP 5xx.
    pub fn retry_on_5xx(mut self, enabled: bool) -> Self {
        self.retry_on_5xx = enabled;
        self
    }

    /// Enables or disables retry on timeouts.
    pub fn retry_on_timeout(mut self, enabled: bool) -> Self {
        self.retry_on_timeout = enabled;
        self
    }

    /// Enables or disables retry on network errors.
    pub fn retry_on_network(mut self, enabled: bool) -> Self {
        self.retry_on_network = enabled;
        self
    }

    /// Delay before the given retry (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay.saturating_mul(factor)
    }

    /// Returns `true` if the outcome of an attempt should be retried.
    pub fn should_retry(&self, outcome: &Result<HttpResponse, TransportError>) -> bool {
        match outcome {
            Ok(response) if response.status == 408 => self.retry_on_timeout,
            Ok(response) => response.is_server_error() && self.retry_on_5xx,
            Err(TransportError::Timeout(_)) => self.retry_on_timeout,
            Err(TransportError::Connect(_) | TransportError::Network(_)) => self.retry_on_network,
            Err(TransportError::CircuitOpen { .. }) => false,
        }
    }
}

/// Returns `true` if the outcome is a transient failure, regardless of
/// which retries are enabled.
pub fn is_transient_failure(outcome: &Result<HttpResponse, TransportError>) -> bool {
    match outcome {
        Ok(response) => response.status == 408 || response.is_server_error(),
        Err(e) => e.is_transient(),
    }
}
