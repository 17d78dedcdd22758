//! Wallet gRPC service implementation.

use crate::interceptors::require_claims;
use crate::proto::wallet;
use crate::status::to_status;
use paylink_core::UserId;
use paylink_security::ensure_subject_matches;
use paylink_service::WalletService;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{debug, info};

/// Exposes ledger deletion to the users service.
///
/// Must be mounted behind [`crate::interceptors::internal_auth_interceptor`].
pub struct WalletGrpcService {
    wallet_service: Arc<dyn WalletService>,
}

impl WalletGrpcService {
    /// Creates a new wallet gRPC service.
    pub fn new(wallet_service: Arc<dyn WalletService>) -> Self {
        Self { wallet_service }
    }
}

#[tonic::async_trait]
impl wallet::wallet_service_server::WalletService for WalletGrpcService {
    async fn delete_user_transactions(
        &self,
        request: Request<wallet::DeleteUserTransactionsRequest>,
    ) -> Result<Response<wallet::DeleteUserTransactionsResponse>, Status> {
        let claims = require_claims(&request)?.clone();
        let req = request.into_inner();
        debug!("gRPC DeleteUserTransactions: {}", req.user_id);

        if req.user_id.trim().is_empty() {
            return Err(Status::invalid_argument("user_id is required"));
        }
        ensure_subject_matches(&claims, &req.user_id).map_err(to_status)?;

        let user_id = UserId::parse(&req.user_id)
            .map_err(|_| Status::invalid_argument("Invalid user ID format"))?;

        let deleted = self
            .wallet_service
            .delete_user_transactions(user_id)
            .await
            .map_err(to_status)?;
        info!(
            "Deleted {} transactions for user {} on internal request",
            deleted.deleted_count, user_id
        );

        Ok(Response::new(wallet::DeleteUserTransactionsResponse {
            success: deleted.success,
            deleted_count: deleted.deleted_count,
        }))
    }
}
