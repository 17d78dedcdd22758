//! # Paylink Resilience
//!
//! Resilience patterns guarding outbound service-to-service calls.
//! Provides failure classification, bounded retry, a circuit breaker with an
//! injectable clock, absolute deadlines, the composer that combines them, and
//! keyed rate limiting for the HTTP edge.

pub mod circuit_breaker;
pub mod classifier;
pub mod clock;
pub mod composer;
pub mod deadline;
pub mod rate_limiter;
pub mod retry;

pub use circuit_breaker::*;
pub use classifier::*;
pub use clock::*;
pub use composer::*;
pub use deadline::*;
pub use rate_limiter::*;
pub use retry::*;
