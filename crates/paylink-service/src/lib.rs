//! # Paylink Service
//!
//! Application layer: the idempotency coordinator guarding mutating
//! endpoints, end-user authentication, and the user and wallet use cases
//! behind them.

pub mod audit_log_service;
pub mod auth_service;
pub mod dto;
pub mod idempotency;
pub mod r#impl;
pub mod user_service;
pub mod wallet_client;
pub mod wallet_service;

pub use audit_log_service::*;
pub use auth_service::*;
pub use dto::*;
pub use idempotency::*;
pub use r#impl::{AuthServiceImpl, UserServiceImpl, WalletServiceImpl};
pub use user_service::*;
pub use wallet_client::*;
pub use wallet_service::*;
