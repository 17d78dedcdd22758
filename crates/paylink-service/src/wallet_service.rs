//! Wallet service trait definition.

use crate::dto::{
    BalanceResponse, CreateTransactionRequest, DeletedTransactions, RequestContext,
    TransactionResponse,
};
use async_trait::async_trait;
use paylink_core::{PaylinkResult, UserId};
use paylink_repository::TransactionKind;

/// Ledger use cases.
#[async_trait]
pub trait WalletService: Send + Sync {
    /// Records a credit or debit for `user_id`.
    async fn create_transaction(
        &self,
        user_id: UserId,
        request: CreateTransactionRequest,
        ctx: &RequestContext,
    ) -> PaylinkResult<TransactionResponse>;

    /// Lists a user's transactions, optionally of one kind.
    async fn list_transactions(
        &self,
        user_id: UserId,
        kind: Option<TransactionKind>,
    ) -> PaylinkResult<Vec<TransactionResponse>>;

    /// Credits minus debits.
    async fn get_balance(&self, user_id: UserId) -> PaylinkResult<BalanceResponse>;

    /// Deletes every transaction of `user_id`.
    async fn delete_user_transactions(&self, user_id: UserId) -> PaylinkResult<DeletedTransactions>;
}
