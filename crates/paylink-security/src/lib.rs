//! # Paylink Security
//!
//! Tokens and credentials for the paylink services:
//! - end-user access tokens issued by the users service and accepted by both,
//! - short-lived, audience-scoped internal tokens for users-to-wallet calls,
//! - Argon2id password hashing.

pub mod access;
pub mod internal;
pub mod password;
mod token_error;

pub use access::*;
pub use internal::*;
pub use password::*;
