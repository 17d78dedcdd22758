//! Resilient call composition: breaker admission, deadline, classified retry.

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::classifier::{is_retryable, StatusCarrier};
use crate::clock::{Clock, SystemClock};
use crate::deadline::Deadline;
use crate::retry::RetryPolicy;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Settings for one downstream dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResilienceConfig {
    /// Budget for the whole call, retries included.
    pub timeout: Duration,
    /// Backoff between attempts.
    pub retry: RetryPolicy,
    /// Breaker thresholds.
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(2000),
            retry: RetryPolicy::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Why a resilient call failed.
#[derive(Debug)]
pub enum ResilienceError<E> {
    /// The breaker rejected the attempt; the downstream was not contacted.
    CircuitOpen(String),
    /// The call's deadline passed before an attempt completed.
    DeadlineExceeded(Duration),
    /// The downstream returned an error.
    Failure(E),
}

impl<E> ResilienceError<E> {
    /// Returns the downstream error, if that is what failed.
    pub fn into_failure(self) -> Option<E> {
        match self {
            Self::Failure(e) => Some(e),
            _ => None,
        }
    }
}

impl<E: StatusCarrier> ResilienceError<E> {
    /// Returns whether another attempt within the same call may succeed.
    ///
    /// Breaker rejections and a spent deadline end the call.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::CircuitOpen(_) | Self::DeadlineExceeded(_) => false,
            Self::Failure(e) => is_retryable(e),
        }
    }
}

impl<E: fmt::Display> fmt::Display for ResilienceError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CircuitOpen(name) => write!(f, "Circuit breaker '{}' is open", name),
            Self::DeadlineExceeded(timeout) => {
                write!(f, "Deadline of {:?} exceeded", timeout)
            }
            Self::Failure(e) => write!(f, "Operation failed: {}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for ResilienceError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Failure(e) => Some(e),
            _ => None,
        }
    }
}

/// Wraps every outbound call to one dependency in retry, breaker, and deadline.
///
/// The breaker is shared by reference so several callers targeting the same
/// dependency observe the same health.
#[derive(Debug, Clone)]
pub struct ResilientCaller {
    retry: RetryPolicy,
    timeout: Duration,
    breaker: Arc<CircuitBreaker>,
    clock: Arc<dyn Clock>,
}

impl ResilientCaller {
    /// Creates a caller with its own breaker on the system clock.
    pub fn new(name: impl Into<String>, config: ResilienceConfig) -> Self {
        Self::with_clock(name, config, Arc::new(SystemClock))
    }

    /// Creates a caller with its own breaker driven by `clock`.
    pub fn with_clock(
        name: impl Into<String>,
        config: ResilienceConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let breaker = Arc::new(CircuitBreaker::with_clock(
            name,
            config.circuit_breaker,
            clock.clone(),
        ));
        Self::from_parts(config.retry, config.timeout, breaker, clock)
    }

    /// Creates a caller around an existing breaker.
    pub fn from_parts(
        retry: RetryPolicy,
        timeout: Duration,
        breaker: Arc<CircuitBreaker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            retry,
            timeout,
            breaker,
            clock,
        }
    }

    /// Returns the breaker guarding this dependency.
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Returns the per-call budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the clock deadlines are measured against.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Runs `op` under the composed policies.
    ///
    /// One absolute deadline is fixed before the first attempt and handed to
    /// every attempt. Each attempt first asks the breaker for admission; a
    /// rejection ends the call without touching the breaker's counters.
    /// Admitted attempts are bounded by the time left on the deadline and
    /// their outcome is recorded on the breaker. A timed-out attempt ends the
    /// call, and no backoff wait starts unless it finishes before the
    /// deadline.
    pub async fn call<F, Fut, T, E>(&self, mut op: F) -> Result<T, ResilienceError<E>>
    where
        F: FnMut(Deadline) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: StatusCarrier + fmt::Display,
    {
        let deadline = Deadline::after(self.clock.as_ref(), self.timeout);
        let breaker = &self.breaker;
        let clock = &self.clock;
        let timeout = self.timeout;

        self.retry
            .execute_within(
                move || {
                    let remaining = deadline.remaining(clock.as_ref());
                    let expired = remaining.is_zero();
                    let admitted = !expired && breaker.can_request();
                    let attempt = admitted.then(|| op(deadline));

                    async move {
                        if expired {
                            return Err(ResilienceError::DeadlineExceeded(timeout));
                        }
                        let Some(attempt) = attempt else {
                            debug!("Circuit breaker '{}' rejected call", breaker.name());
                            return Err(ResilienceError::CircuitOpen(breaker.name().to_string()));
                        };

                        match tokio::time::timeout(remaining, attempt).await {
                            Ok(Ok(value)) => {
                                breaker.record_success();
                                Ok(value)
                            }
                            Ok(Err(e)) => {
                                breaker.record_failure();
                                Err(ResilienceError::Failure(e))
                            }
                            Err(_) => {
                                breaker.record_failure();
                                Err(ResilienceError::DeadlineExceeded(timeout))
                            }
                        }
                    }
                },
                |e: &ResilienceError<E>| e.is_retryable(),
                move || deadline.remaining(clock.as_ref()),
            )
            .await
    }
}
