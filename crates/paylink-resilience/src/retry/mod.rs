//! Retry policy implementation.

use std::time::Duration;
use tracing::debug;

/// Bounded exponential backoff.
///
/// An operation runs at most `retries + 1` times. Before retry `n` (0-indexed)
/// the policy waits `min(max_delay, base_delay * 2^n)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given retry count and default delays.
    #[must_use]
    pub fn with_retries(retries: u32) -> Self {
        Self {
            retries,
            ..Default::default()
        }
    }

    /// Creates a policy that never waits between attempts.
    #[must_use]
    pub const fn immediate(retries: u32) -> Self {
        Self {
            retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Calculates the wait after the failed attempt `attempt` (0-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Executes `f`, retrying every failure.
    pub async fn execute<F, Fut, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        self.execute_if(f, |_| true).await
    }

    /// Executes `f`, retrying only failures approved by `should_retry`.
    ///
    /// The last failure is returned as soon as attempts are exhausted or the
    /// predicate declines, without a final wait.
    pub async fn execute_if<F, Fut, T, E, P>(&self, f: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        P: Fn(&E) -> bool,
    {
        self.execute_within(f, should_retry, || Duration::MAX).await
    }

    /// Like [`execute_if`](Self::execute_if), bounded by a time budget.
    ///
    /// `remaining` reports the budget left. The last failure is returned
    /// instead of waiting when the budget is spent or the next delay would
    /// not end before it does.
    pub async fn execute_within<F, Fut, T, E, P, R>(
        &self,
        mut f: F,
        should_retry: P,
        remaining: R,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        P: Fn(&E) -> bool,
        R: Fn() -> Duration,
    {
        let mut attempt = 0;

        loop {
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if attempt >= self.retries {
                        debug!("Attempt {} failed, retries exhausted: {}", attempt + 1, e);
                        return Err(e);
                    }
                    if !should_retry(&e) {
                        debug!("Attempt {} failed with non-retryable error: {}", attempt + 1, e);
                        return Err(e);
                    }

                    let delay = self.delay_for_attempt(attempt);
                    let left = remaining();
                    if left.is_zero() || delay >= left {
                        debug!(
                            "Attempt {} failed: {}; {:?} left, not waiting {:?}",
                            attempt + 1,
                            e,
                            left,
                            delay
                        );
                        return Err(e);
                    }
                    debug!("Attempt {} failed: {}; retrying after {:?}", attempt + 1, e, delay);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}
