//! Circuit breaker implementation.

use crate::clock::{Clock, SystemClock};
use paylink_core::PaylinkError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Counter incremented each time a breaker opens, labelled by breaker name.
pub const CIRCUIT_OPENED_TOTAL: &str = "paylink_circuit_breaker_opened_total";
/// Counter incremented for each call rejected while open.
pub const CIRCUIT_REJECTED_TOTAL: &str = "paylink_circuit_breaker_rejected_total";

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow through.
    Closed,
    /// Calls are rejected until the reset window elapses.
    Open,
    /// A single trial call decides whether to close or reopen.
    HalfOpen,
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// Time the circuit stays open before admitting a trial call.
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    next_attempt_at: Option<SystemTime>,
    trial_started_at: Option<SystemTime>,
}

impl BreakerState {
    const fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            next_attempt_at: None,
            trial_started_at: None,
        }
    }
}

/// Tracks consecutive failures of one downstream dependency.
///
/// Every read-modify-write of the state happens under a single lock, so the
/// breaker can be shared by all concurrent calls to that dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Creates a circuit breaker using the system clock.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self::with_clock(name, config, Arc::new(SystemClock))
    }

    /// Creates a circuit breaker with default configuration.
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::new(name, CircuitBreakerConfig::default())
    }

    /// Creates a circuit breaker driven by `clock`.
    pub fn with_clock(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            clock,
            inner: Mutex::new(BreakerState::closed()),
        }
    }

    /// Returns the name of the circuit breaker.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Returns the current state without side effects.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Returns the current consecutive failure count.
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    /// Returns when the open circuit will admit a trial call.
    pub fn next_attempt_at(&self) -> Option<SystemTime> {
        self.inner.lock().next_attempt_at
    }

    /// Decides whether a call may proceed.
    ///
    /// Must be consulted before invoking the protected operation. When an
    /// open circuit's window has elapsed this moves it to half-open and
    /// admits exactly one trial. An admitted call must be followed by exactly
    /// one [`record_success`](Self::record_success) or
    /// [`record_failure`](Self::record_failure).
    pub fn can_request(&self) -> bool {
        let mut inner = self.inner.lock();
        let now = self.clock.now();

        let admitted = match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => match inner.next_attempt_at {
                Some(at) if now < at => false,
                _ => {
                    inner.state = CircuitState::HalfOpen;
                    inner.trial_started_at = Some(now);
                    debug!("Circuit breaker '{}' transitioning to half-open", self.name);
                    true
                }
            },
            CircuitState::HalfOpen => {
                // A trial whose outcome was never recorded (its caller was
                // cancelled) is abandoned after one reset window.
                let trial_stale = inner.trial_started_at.map_or(true, |started| {
                    now.duration_since(started).unwrap_or_default() >= self.config.reset_timeout
                });
                if trial_stale {
                    inner.trial_started_at = Some(now);
                }
                trial_stale
            }
        };

        if !admitted {
            metrics::counter!(CIRCUIT_REJECTED_TOTAL, "breaker" => self.name.clone()).increment(1);
        }
        admitted
    }

    /// Records a successful call: closes the circuit and clears the count.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        let previous = inner.state;
        *inner = BreakerState::closed();

        if previous != CircuitState::Closed {
            info!("Circuit breaker '{}' closed after successful trial", self.name);
        }
    }

    /// Records a failed call.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        let now = self.clock.now();
        inner.failure_count = inner.failure_count.saturating_add(1);

        let reopen_trial = inner.state == CircuitState::HalfOpen;
        if reopen_trial || inner.failure_count >= self.config.failure_threshold {
            let was_open = inner.state == CircuitState::Open;
            inner.state = CircuitState::Open;
            inner.next_attempt_at = Some(now + self.config.reset_timeout);
            inner.trial_started_at = None;

            if reopen_trial {
                warn!(
                    "Circuit breaker '{}' reopened after failure in half-open state",
                    self.name
                );
            } else if !was_open {
                warn!(
                    "Circuit breaker '{}' opened after {} failures",
                    self.name, inner.failure_count
                );
            }
            if !was_open {
                metrics::counter!(CIRCUIT_OPENED_TOTAL, "breaker" => self.name.clone())
                    .increment(1);
            }
        }
    }

    /// Manually resets the circuit breaker to closed state.
    pub fn reset(&self) {
        *self.inner.lock() = BreakerState::closed();
        debug!("Circuit breaker '{}' manually reset", self.name);
    }

    /// Executes a function with circuit breaker protection.
    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        if !self.can_request() {
            return Err(CircuitBreakerError::Open(self.name.clone()));
        }

        match f().await {
            Ok(result) => {
                self.record_success();
                Ok(result)
            }
            Err(e) => {
                self.record_failure();
                Err(CircuitBreakerError::Failure(e))
            }
        }
    }
}

/// Error type for circuit breaker operations.
#[derive(Debug)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open, request was rejected.
    Open(String),
    /// The underlying operation failed.
    Failure(E),
}

impl<E: std::fmt::Display> std::fmt::Display for CircuitBreakerError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open(name) => write!(f, "Circuit breaker '{}' is open", name),
            Self::Failure(e) => write!(f, "Operation failed: {}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for CircuitBreakerError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open(_) => None,
            Self::Failure(e) => Some(e),
        }
    }
}

impl<E> From<CircuitBreakerError<E>> for PaylinkError
where
    E: Into<PaylinkError>,
{
    fn from(err: CircuitBreakerError<E>) -> Self {
        match err {
            CircuitBreakerError::Open(name) => PaylinkError::CircuitBreakerOpen(name),
            CircuitBreakerError::Failure(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn breaker(threshold: u32, reset_ms: u64) -> (CircuitBreaker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at_epoch());
        let config = CircuitBreakerConfig {
            failure_threshold: threshold,
            reset_timeout: Duration::from_millis(reset_ms),
        };
        let cb = CircuitBreaker::with_clock("wallet", config, clock.clone());
        (cb, clock)
    }

    #[test]
    fn test_initial_state() {
        let cb = CircuitBreaker::with_defaults("test");
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
        assert!(cb.next_attempt_at().is_none());
        assert!(cb.can_request());
    }

    #[test]
    fn test_opens_at_threshold() {
        let (cb, clock) = breaker(3, 1000);

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.can_request());

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(
            cb.next_attempt_at(),
            Some(clock.now() + Duration::from_millis(1000))
        );
        assert!(!cb.can_request());
    }

    #[test]
    fn test_success_resets_failure_count() {
        let (cb, _) = breaker(3, 1000);

        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        cb.record_failure();

        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 2);
    }

    #[test]
    fn test_rejects_until_window_then_admits_one_trial() {
        let (cb, clock) = breaker(5, 10_000);
        for _ in 0..5 {
            cb.record_failure();
        }

        clock.advance(Duration::from_millis(9_999));
        assert!(!cb.can_request());
        assert_eq!(cb.state(), CircuitState::Open);

        clock.advance(Duration::from_millis(1));
        assert!(cb.can_request());
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        // The trial is in flight; nobody else gets through.
        assert!(!cb.can_request());
        assert!(!cb.can_request());
    }

    #[test]
    fn test_trial_success_closes() {
        let (cb, clock) = breaker(1, 500);
        cb.record_failure();
        clock.advance(Duration::from_millis(500));

        assert!(cb.can_request());
        cb.record_success();

        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
        assert!(cb.can_request());
        assert!(cb.can_request());
    }

    #[test]
    fn test_trial_failure_reopens_with_fresh_window() {
        let (cb, clock) = breaker(2, 500);
        cb.record_failure();
        cb.record_failure();
        clock.advance(Duration::from_millis(600));

        assert!(cb.can_request());
        cb.record_failure();

        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(
            cb.next_attempt_at(),
            Some(clock.now() + Duration::from_millis(500))
        );
        assert!(!cb.can_request());

        clock.advance(Duration::from_millis(500));
        assert!(cb.can_request());
    }

    #[test]
    fn test_abandoned_trial_is_replaced_after_window() {
        let (cb, clock) = breaker(1, 100);
        cb.record_failure();
        clock.advance(Duration::from_millis(100));
        assert!(cb.can_request());

        clock.advance(Duration::from_millis(99));
        assert!(!cb.can_request());

        clock.advance(Duration::from_millis(1));
        assert!(cb.can_request());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn test_reset() {
        let (cb, _) = breaker(1, 60_000);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);

        cb.reset();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.can_request());
    }

    #[tokio::test]
    async fn test_call_short_circuits_when_open() {
        let (cb, _) = breaker(2, 60_000);

        let _ = cb.call(|| async { Err::<i32, &str>("error") }).await;
        let _ = cb.call(|| async { Err::<i32, &str>("error") }).await;
        assert_eq!(cb.state(), CircuitState::Open);

        let mut invoked = false;
        let result = cb
            .call(|| {
                invoked = true;
                async { Ok::<i32, &str>(42) }
            })
            .await;
        assert!(matches!(result, Err(CircuitBreakerError::Open(name)) if name == "wallet"));
        assert!(!invoked);
    }

    #[tokio::test]
    async fn test_call_passes_values_and_failures() {
        let cb = CircuitBreaker::with_defaults("test");
        assert_eq!(cb.call(|| async { Ok::<i32, &str>(99) }).await.unwrap(), 99);

        match cb.call(|| async { Err::<i32, &str>("some error") }).await {
            Err(CircuitBreakerError::Failure(e)) => assert_eq!(e, "some error"),
            other => panic!("Expected Failure error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_conversion() {
        let open: CircuitBreakerError<PaylinkError> = CircuitBreakerError::Open("wallet".into());
        assert!(matches!(PaylinkError::from(open), PaylinkError::CircuitBreakerOpen(_)));

        let failure = CircuitBreakerError::Failure(PaylinkError::validation("bad"));
        assert!(matches!(PaylinkError::from(failure), PaylinkError::Validation(_)));
    }

    #[test]
    fn test_config_default() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.reset_timeout, Duration::from_secs(10));
    }
}
