//! gRPC service implementations.

mod wallet_service;

pub use wallet_service::*;
