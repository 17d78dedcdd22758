//! Idempotency coordination for mutating endpoints.

mod coordinator;
mod request_hash;

pub use coordinator::*;
pub use request_hash::*;
