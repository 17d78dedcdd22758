//! Absolute deadlines for outbound calls.

use crate::clock::Clock;
use std::time::{Duration, SystemTime};

/// A fixed wall-clock instant by which a call must complete.
///
/// Computed once per outbound call, so retries share the budget instead of
/// each getting a fresh timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    at: SystemTime,
}

impl Deadline {
    /// Creates a deadline `timeout` after the clock's current time.
    pub fn after(clock: &dyn Clock, timeout: Duration) -> Self {
        Self {
            at: clock.now() + timeout,
        }
    }

    /// Creates a deadline at an absolute instant.
    #[must_use]
    pub const fn at(at: SystemTime) -> Self {
        Self { at }
    }

    /// Returns the absolute instant.
    #[must_use]
    pub const fn instant(&self) -> SystemTime {
        self.at
    }

    /// Returns the time left, or zero once the deadline has passed.
    pub fn remaining(&self, clock: &dyn Clock) -> Duration {
        self.at.duration_since(clock.now()).unwrap_or(Duration::ZERO)
    }

    /// Returns true once the deadline has passed.
    pub fn is_expired(&self, clock: &dyn Clock) -> bool {
        self.remaining(clock).is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_deadline_is_now_plus_timeout() {
        let clock = ManualClock::at_epoch();
        clock.advance(Duration::from_millis(1000));

        let deadline = Deadline::after(&clock, Duration::from_millis(2000));

        assert_eq!(
            deadline.instant(),
            SystemTime::UNIX_EPOCH + Duration::from_millis(3000)
        );
    }

    #[test]
    fn test_remaining_shrinks_and_saturates() {
        let clock = ManualClock::at_epoch();
        let deadline = Deadline::after(&clock, Duration::from_millis(2000));
        assert_eq!(deadline.remaining(&clock), Duration::from_millis(2000));

        clock.advance(Duration::from_millis(1500));
        assert_eq!(deadline.remaining(&clock), Duration::from_millis(500));
        assert!(!deadline.is_expired(&clock));

        clock.advance(Duration::from_millis(600));
        assert_eq!(deadline.remaining(&clock), Duration::ZERO);
        assert!(deadline.is_expired(&clock));
    }
}
