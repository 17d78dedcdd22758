//! # Paylink gRPC
//!
//! The internal channel between the two services: the wallet's
//! `DeleteUserTransactions` endpoint guarded by internal tokens, and the
//! resilient client the users service calls it through. Both sides speak
//! mTLS when enabled.

pub mod clients;
pub mod interceptors;
pub mod proto;
pub mod server;
pub mod services;
pub mod status;
pub mod tls;

pub use clients::*;
pub use server::*;
pub use services::*;
pub use status::{map_grpc_error, to_status};
pub use tls::{client_tls_from_config, server_tls_from_config, TlsMaterial};
