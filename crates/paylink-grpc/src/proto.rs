//! Generated protobuf types.

/// Wallet service messages, client, and server.
pub mod wallet {
    tonic::include_proto!("paylink.wallet");
}
