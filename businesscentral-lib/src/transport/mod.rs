//! HTTP execution: the backend seam and the resilience policies around it.
//!
//! - [`HttpBackend`] - sends one request; [`ReqwestBackend`] is the default
//! - [`RetryConfig`] - retry of transient failures with exponential backoff
//! - [`CircuitBreakerConfig`] - fail fast after repeated transient failures
//! - [`ResilientTransport`] - composes the above (breaker wraps retry)

mod breaker;
mod http;
mod resilient;
mod retry;

pub use breaker::CircuitBreaker;
pub use breaker::CircuitBreakerConfig;
pub use breaker::CircuitState;
pub use http::HttpBackend;
pub use http::HttpRequest;
pub use http::HttpResponse;
pub use http::ReqwestBackend;
pub use resilient::ResilientTransport;
pub use retry::RetryConfig;
pub use retry::is_transient_failure;
