//! Custom Axum extractors.

mod claims;
mod client_info;
mod idempotency_key;
mod validated;

pub use claims::*;
pub use client_info::*;
pub use idempotency_key::*;
pub use validated::*;
