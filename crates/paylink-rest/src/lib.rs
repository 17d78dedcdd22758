//! # Paylink REST
//!
//! Axum HTTP surface for both services. Routes other than sign-up, login,
//! and health require an access token and act on its subject. Mutating
//! routes require an `Idempotency-Key` header and run through the
//! idempotency coordinator, so a retried request replays the first response
//! instead of repeating its side effects.

pub mod controllers;
pub mod extractors;
pub mod idempotency;
pub mod middleware;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
