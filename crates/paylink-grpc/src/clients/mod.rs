//! Outbound clients for service-to-service calls.

mod wallet_client;

pub use wallet_client::*;
