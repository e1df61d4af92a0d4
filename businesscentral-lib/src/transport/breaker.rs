//! Circuit breaker shared by all calls through one transport.

use std::time::Duration;

use log::debug;
use log::warn;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::TransportError;

/// Configuration for the circuit breaker.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use businesscentral_lib::transport::CircuitBreakerConfig;
///
/// // Open after 5 consecutive transient failures, for 30 seconds
/// let config = CircuitBreakerConfig::default();
///
/// let strict = CircuitBreakerConfig::default()
///     .failure_threshold(2)
///     .break_duration(Duration::from_secs(60));
///
/// let off = CircuitBreakerConfig::disabled();
/// ```
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Whether the breaker is active.
    pub enabled: bool,
    /// Consecutive transient failures that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before a probe is allowed.
    pub break_duration: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: 5,
            break_duration: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    /// Creates a config that never opens the circuit.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Sets the number of consecutive failures that open the circuit.
    pub fn failure_threshold(mut self, n: u32) -> Self {
        self.failure_threshold = n.max(1);
        self
    }

    /// Sets how long the circuit stays open.
    pub fn break_duration(mut self, duration: Duration) -> Self {
        self.break_duration = duration;
        self
    }
}

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally.
    Closed,
    /// Calls are rejected without being attempted.
    Open,
    /// One probe call is allowed through.
    HalfOpen,
}

/// Whether an admitted call is the half-open probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Closed,
    Probe,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    open_until: Option<Instant>,
    probe_started: Option<Instant>,
}

impl Default for BreakerState {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            open_until: None,
            probe_started: None,
        }
    }
}

/// Counts consecutive transient failures and rejects calls while open.
///
/// Safe to share between concurrent callers.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Creates a closed breaker.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BreakerState::default()),
        }
    }

    /// Returns the current state.
    pub async fn state(&self) -> CircuitState {
        self.state.lock().await.state
    }

    /// Admits or rejects a call.
    pub(crate) async fn acquire(&self) -> Result<Admission, TransportError> {
        if !self.config.enabled {
            return Ok(Admission::Closed);
        }

        let mut state = self.state.lock().await;
        let now = Instant::now();

        if state.state == CircuitState::Open {
            if let Some(open_until) = state.open_until
                && now < open_until
            {
                return Err(TransportError::CircuitOpen {
                    retry_after: open_until - now,
                });
            }
            debug!("Circuit half-open, allowing probe");
            state.state = CircuitState::HalfOpen;
            state.open_until = None;
            state.probe_started = None;
        }

        if state.state == CircuitState::HalfOpen {
            // A probe that never reported back (dropped future) stops blocking
            // after one break duration.
            if let Some(started) = state.probe_started
                && now.duration_since(started) < self.config.break_duration
            {
                return Err(TransportError::CircuitOpen {
                    retry_after: self.config.break_duration - now.duration_since(started),
                });
            }
            state.probe_started = Some(now);
            return Ok(Admission::Probe);
        }

        Ok(Admission::Closed)
    }

    /// Records a call that did not end in a transient failure.
    ///
    /// Only the half-open probe closes the circuit. A call admitted before
    /// the circuit opened does not affect an open or half-open circuit.
    pub(crate) async fn record_success(&self, admission: Admission) {
        if !self.config.enabled {
            return;
        }

        let mut state = self.state.lock().await;
        match (state.state, admission) {
            (CircuitState::Closed, _) => state.consecutive_failures = 0,
            (CircuitState::HalfOpen, Admission::Probe) => {
                debug!("Circuit closed");
                *state = BreakerState::default();
            }
            _ => debug!("Ignoring success admitted before the circuit opened"),
        }
    }

    /// Records a call that ended in a transient failure.
    pub(crate) async fn record_failure(&self, admission: Admission) {
        if !self.config.enabled {
            return;
        }

        let mut state = self.state.lock().await;
        match (state.state, admission) {
            (CircuitState::Closed, _) => {
                state.consecutive_failures = state.consecutive_failures.saturating_add(1);
                if state.consecutive_failures >= self.config.failure_threshold {
                    warn!(
                        "Circuit opened after {} consecutive failures, rejecting calls for {:?}",
                        state.consecutive_failures, self.config.break_duration
                    );
                    self.open(&mut state);
                }
            }
            (CircuitState::HalfOpen, Admission::Probe) => {
                warn!(
                    "Probe failed, rejecting calls for {:?}",
                    self.config.break_duration
                );
                self.open(&mut state);
            }
            _ => {}
        }
    }

    fn open(&self, state: &mut BreakerState) {
        state.state = CircuitState::Open;
        state.open_until = Some(Instant::now() + self.config.break_duration);
        state.probe_started = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    async fn fail(breaker: &CircuitBreaker, times: u32) {
        for _ in 0..times {
            let admission = breaker.acquire().await.unwrap();
            breaker.record_failure(admission).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_after_threshold() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
        fail(&breaker, 4).await;
        assert_eq!(breaker.state().await, CircuitState::Closed);

        fail(&breaker, 1).await;
        assert_eq!(breaker.state().await, CircuitState::Open);

        let err = breaker.acquire().await.unwrap_err();
        match err {
            TransportError::CircuitOpen { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(30));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_consecutive_count() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
        fail(&breaker, 4).await;

        let admission = breaker.acquire().await.unwrap();
        breaker.record_success(admission).await;

        fail(&breaker, 4).await;
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_probe_closes_on_success() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
        fail(&breaker, 5).await;

        tokio::time::advance(Duration::from_secs(30)).await;

        let probe = breaker.acquire().await.unwrap();
        assert_eq!(probe, Admission::Probe);
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);

        // Only one probe at a time
        assert!(breaker.acquire().await.is_err());

        breaker.record_success(probe).await;
        assert_eq!(breaker.state().await, CircuitState::Closed);
        assert_eq!(breaker.acquire().await.unwrap(), Admission::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_probe_failure_reopens() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
        fail(&breaker, 5).await;

        tokio::time::advance(Duration::from_secs(31)).await;

        let probe = breaker.acquire().await.unwrap();
        breaker.record_failure(probe).await;
        assert_eq!(breaker.state().await, CircuitState::Open);
        assert!(breaker.acquire().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_never_opens() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::disabled());
        fail(&breaker, 50).await;
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_admitted_before_opening_keeps_circuit_open() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
        let mut admissions = Vec::new();
        for _ in 0..6 {
            admissions.push(breaker.acquire().await.unwrap());
        }

        for admission in &admissions[..5] {
            breaker.record_failure(*admission).await;
        }
        assert_eq!(breaker.state().await, CircuitState::Open);

        breaker.record_success(admissions[5]).await;
        assert_eq!(breaker.state().await, CircuitState::Open);

        tokio::time::advance(Duration::from_secs(1)).await;
        match breaker.acquire().await {
            Err(TransportError::CircuitOpen { retry_after }) => {
                assert_eq!(retry_after, Duration::from_secs(29));
            }
            other => panic!("expected open circuit, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_admitted_before_opening_does_not_fail_probe() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
        let stale = breaker.acquire().await.unwrap();
        fail(&breaker, 5).await;

        tokio::time::advance(Duration::from_secs(30)).await;
        let probe = breaker.acquire().await.unwrap();
        assert_eq!(probe, Admission::Probe);

        breaker.record_failure(stale).await;
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);

        breaker.record_success(probe).await;
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_outcomes_from_many_threads() {
        let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default()));
        let mut admissions = Vec::new();
        for _ in 0..10 {
            admissions.push(breaker.acquire().await.unwrap());
        }
        let late = admissions.split_off(5);

        let failures: Vec<_> = admissions
            .into_iter()
            .map(|admission| {
                let breaker = Arc::clone(&breaker);
                tokio::spawn(async move { breaker.record_failure(admission).await })
            })
            .collect();
        for handle in failures {
            handle.await.unwrap();
        }
        assert_eq!(breaker.state().await, CircuitState::Open);

        let successes: Vec<_> = late
            .into_iter()
            .map(|admission| {
                let breaker = Arc::clone(&breaker);
                tokio::spawn(async move { breaker.record_success(admission).await })
            })
            .collect();
        for handle in successes {
            handle.await.unwrap();
        }
        assert_eq!(breaker.state().await, CircuitState::Open);

        let attempts: Vec<_> = (0..8)
            .map(|_| {
                let breaker = Arc::clone(&breaker);
                tokio::spawn(async move { breaker.acquire().await })
            })
            .collect();
        for handle in attempts {
            assert!(matches!(
                handle.await.unwrap(),
                Err(TransportError::CircuitOpen { .. })
            ));
        }
    }
}
