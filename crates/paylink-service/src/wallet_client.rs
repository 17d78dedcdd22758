//! Outbound port from the users service to the wallet service.

use crate::dto::DeletedTransactions;
use async_trait::async_trait;
use paylink_core::{PaylinkResult, UserId};

/// Operations the users service needs from the wallet.
///
/// Implementations are expected to apply their own retry, breaker, and
/// deadline policy; callers treat any error as final.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletClient: Send + Sync {
    /// Deletes every transaction owned by `user_id`.
    async fn delete_user_transactions(&self, user_id: UserId) -> PaylinkResult<DeletedTransactions>;
}
