//! Keyed rate limiter implementation.

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter as GovernorRateLimiter};
use paylink_core::PaylinkError;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Rate limiter tracking a separate quota per key (e.g. client address).
pub struct RateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
}

impl RateLimiter {
    /// Allows `requests` per minute per key.
    pub fn per_minute(requests: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN));
        Self::from_quota(quota)
    }

    /// Allows a burst of `requests` per key, replenished evenly over `window`.
    pub fn per_window(requests: u32, window: Duration) -> Self {
        let burst = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(window / burst.get())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);
        Self::from_quota(quota)
    }

    fn from_quota(quota: Quota) -> Self {
        Self {
            limiter: Arc::new(GovernorRateLimiter::keyed(quota)),
        }
    }

    /// Checks if a request for `key` is allowed (non-blocking).
    pub fn check(&self, key: &str) -> Result<(), PaylinkError> {
        self.limiter
            .check_key(&key.to_string())
            .map_err(|_| PaylinkError::RateLimitExceeded)
    }

    /// Drops state for keys whose quota has fully replenished.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }
}

impl Clone for RateLimiter {
    fn clone(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}
