//! A downstream fails five times in a row: the sixth call fails fast without
//! contacting it, and once the reset window elapses the seventh call reaches
//! the downstream again.

use paylink_resilience::{
    CircuitBreakerConfig, CircuitState, ManualClock, ResilienceConfig, ResilienceError,
    ResilientCaller, RetryPolicy,
};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tonic::Status;

struct Downstream {
    calls: AtomicU32,
    healthy: AtomicBool,
}

impl Downstream {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            healthy: AtomicBool::new(false),
        })
    }

    async fn delete_user_transactions(&self) -> Result<u32, Status> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.healthy.load(Ordering::SeqCst) {
            Ok(4)
        } else {
            Err(Status::unavailable("wallet is down"))
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

fn wallet_caller(clock: Arc<ManualClock>) -> ResilientCaller {
    let config = ResilienceConfig {
        timeout: Duration::from_secs(2),
        retry: RetryPolicy::immediate(0),
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(10),
        },
    };
    ResilientCaller::with_clock("wallet", config, clock)
}

async fn invoke(
    caller: &ResilientCaller,
    downstream: &Arc<Downstream>,
) -> Result<u32, ResilienceError<Status>> {
    caller
        .call(|_| {
            let downstream = downstream.clone();
            async move { downstream.delete_user_transactions().await }
        })
        .await
}

#[tokio::test]
async fn test_breaker_opens_fails_fast_and_admits_trial_after_window() {
    let clock = Arc::new(ManualClock::at_epoch());
    let caller = wallet_caller(clock.clone());
    let downstream = Downstream::new();

    for n in 1..=5 {
        let result = invoke(&caller, &downstream).await;
        assert!(matches!(result, Err(ResilienceError::Failure(_))), "call {}", n);
    }
    assert_eq!(downstream.calls(), 5);
    assert_eq!(caller.breaker().state(), CircuitState::Open);

    // 6th call within the window: rejected locally.
    clock.advance(Duration::from_secs(5));
    let sixth = invoke(&caller, &downstream).await;
    assert!(matches!(sixth, Err(ResilienceError::CircuitOpen(_))));
    assert_eq!(downstream.calls(), 5);

    // 7th call after the window: reaches the downstream again.
    clock.advance(Duration::from_secs(5));
    downstream.healthy.store(true, Ordering::SeqCst);
    let seventh = invoke(&caller, &downstream).await;
    assert_eq!(seventh.unwrap(), 4);
    assert_eq!(downstream.calls(), 6);
    assert_eq!(caller.breaker().state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_failed_trial_reopens_for_another_window() {
    let clock = Arc::new(ManualClock::at_epoch());
    let caller = wallet_caller(clock.clone());
    let downstream = Downstream::new();

    for _ in 0..5 {
        let _ = invoke(&caller, &downstream).await;
    }
    clock.advance(Duration::from_secs(10));

    let trial = invoke(&caller, &downstream).await;
    assert!(matches!(trial, Err(ResilienceError::Failure(_))));
    assert_eq!(downstream.calls(), 6);
    assert_eq!(caller.breaker().state(), CircuitState::Open);

    let rejected = invoke(&caller, &downstream).await;
    assert!(matches!(rejected, Err(ResilienceError::CircuitOpen(_))));
    assert_eq!(downstream.calls(), 6);
}

#[tokio::test]
async fn test_retries_stop_once_breaker_opens_mid_call() {
    let clock = Arc::new(ManualClock::at_epoch());
    let config = ResilienceConfig {
        timeout: Duration::from_secs(2),
        retry: RetryPolicy::immediate(10),
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: 3,
            reset_timeout: Duration::from_secs(10),
        },
    };
    let caller = ResilientCaller::with_clock("wallet", config, clock);
    let downstream = Downstream::new();

    let result = invoke(&caller, &downstream).await;

    assert!(matches!(result, Err(ResilienceError::CircuitOpen(_))));
    assert_eq!(downstream.calls(), 3);
}
