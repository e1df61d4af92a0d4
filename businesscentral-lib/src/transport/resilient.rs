//! Retry and circuit breaking around an [`HttpBackend`].

use std::sync::Arc;

use log::debug;
use log::warn;

use super::CircuitBreaker;
use super::CircuitBreakerConfig;
use super::CircuitState;
use super::HttpBackend;
use super::HttpRequest;
use super::HttpResponse;
use super::RetryConfig;
use super::retry::is_transient_failure;
use crate::error::TransportError;

/// Executes requests with retry, wrapped in a circuit breaker.
///
/// One call (with all of its retries) counts as one breaker outcome. A call
/// whose retries end on a transient failure counts as a failure; anything
/// else, including 4xx responses, resets the failure count.
///
/// A 5xx response that survives all retries is returned as a response, not
/// an error, so the caller can decode the error body.
pub struct ResilientTransport {
    backend: Arc<dyn HttpBackend>,
    retry: RetryConfig,
    breaker: CircuitBreaker,
}

impl std::fmt::Debug for ResilientTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientTransport")
            .field("retry", &self.retry)
            .field("breaker", &self.breaker)
            .finish_non_exhaustive()
    }
}

impl ResilientTransport {
    /// Creates a transport over the given backend.
    pub fn new(
        backend: Arc<dyn HttpBackend>,
        retry: RetryConfig,
        breaker: CircuitBreakerConfig,
    ) -> Self {
        Self {
            backend,
            retry,
            breaker: CircuitBreaker::new(breaker),
        }
    }

    /// Returns the retry configuration.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Returns the current circuit state.
    pub async fn circuit_state(&self) -> CircuitState {
        self.breaker.state().await
    }

    /// Sends a request through the breaker and the retry policy.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let admission = self.breaker.acquire().await?;
        let outcome = self.send_with_retry(request).await;

        if is_transient_failure(&outcome) {
            self.breaker.record_failure(admission).await;
        } else {
            self.breaker.record_success(admission).await;
        }

        outcome
    }

    async fn send_with_retry(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut retries = 0;

        loop {
            debug!("{} {} (attempt {})", request.method, request.url, retries + 1);
            let outcome = self.backend.send(request.clone()).await;

            if retries >= self.retry.max_retries || !self.retry.should_retry(&outcome) {
                return outcome;
            }

            retries += 1;
            let delay = self.retry.delay_for(retries);
            match &outcome {
                Ok(response) => warn!(
                    "{} {} returned {}, retrying in {:?} ({}/{})",
                    request.method, request.url, response.status, delay, retries, self.retry.max_retries
                ),
                Err(e) => warn!(
                    "{} {} failed: {}, retrying in {:?} ({}/{})",
                    request.method, request.url, e, delay, retries, self.retry.max_retries
                ),
            }
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    struct Scripted {
        outcomes: Mutex<Vec<Result<HttpResponse, TransportError>>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(mut outcomes: Vec<Result<HttpResponse, TransportError>>) -> Arc<Self> {
            outcomes.reverse();
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl HttpBackend for Scripted {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            *self.calls.lock().unwrap() += 1;
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(HttpResponse::new(200, "{}")))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_then_succeeds() {
        let backend = Scripted::new(vec![
            Ok(HttpResponse::new(503, "")),
            Err(TransportError::Connect("refused".into())),
            Ok(HttpResponse::new(200, "{\"value\":[]}")),
        ]);
        let transport = ResilientTransport::new(
            backend.clone(),
            RetryConfig::default(),
            CircuitBreakerConfig::default(),
        );

        let start = tokio::time::Instant::now();
        let response = transport.send(HttpRequest::get("http://x/a")).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(backend.calls(), 3);
        // 2s + 4s of backoff
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_return_last_response() {
        let backend = Scripted::new(vec![
            Ok(HttpResponse::new(500, "a")),
            Ok(HttpResponse::new(500, "b")),
            Ok(HttpResponse::new(500, "c")),
            Ok(HttpResponse::new(500, "d")),
            Ok(HttpResponse::new(200, "unreached")),
        ]);
        let transport = ResilientTransport::new(
            backend.clone(),
            RetryConfig::default(),
            CircuitBreakerConfig::default(),
        );

        let response = transport.send(HttpRequest::get("http://x/a")).await.unwrap();
        assert_eq!(response.status, 500);
        assert_eq!(response.body, "d");
        assert_eq!(backend.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_errors_are_not_retried() {
        let backend = Scripted::new(vec![Ok(HttpResponse::new(404, "")), Ok(HttpResponse::new(429, ""))]);
        let transport = ResilientTransport::new(
            backend.clone(),
            RetryConfig::default(),
            CircuitBreakerConfig::default(),
        );

        assert_eq!(transport.send(HttpRequest::get("http://x/a")).await.unwrap().status, 404);
        assert_eq!(transport.send(HttpRequest::get("http://x/a")).await.unwrap().status, 429);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_breaker_counts_calls_not_attempts() {
        let backend = Scripted::new(
            (0..8)
                .map(|_| Err(TransportError::Timeout("slow".into())))
                .collect(),
        );
        let transport = ResilientTransport::new(
            backend.clone(),
            RetryConfig::default().max_retries(1),
            CircuitBreakerConfig::default(),
        );

        for _ in 0..4 {
            assert!(transport.send(HttpRequest::get("http://x/a")).await.is_err());
        }
        assert_eq!(backend.calls(), 8);
        assert_eq!(transport.circuit_state().await, CircuitState::Closed);
    }
}
