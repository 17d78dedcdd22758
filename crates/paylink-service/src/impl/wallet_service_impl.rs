//! Wallet service implementation.

use crate::audit_log_service::AuditLogService;
use crate::dto::{
    BalanceResponse, CreateTransactionRequest, DeletedTransactions, RequestContext,
    TransactionResponse,
};
use crate::wallet_service::WalletService;
use async_trait::async_trait;
use paylink_core::{PaylinkResult, UserId, ValidateExt};
use paylink_repository::{
    AuditAction, NewTransaction, TransactionFilter, TransactionKind, TransactionRepository,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

pub struct WalletServiceImpl {
    transactions: Arc<dyn TransactionRepository>,
    audit_log: AuditLogService,
}

impl WalletServiceImpl {
    pub fn new(transactions: Arc<dyn TransactionRepository>, audit_log: AuditLogService) -> Self {
        Self {
            transactions,
            audit_log,
        }
    }
}

#[async_trait]
impl WalletService for WalletServiceImpl {
    async fn create_transaction(
        &self,
        user_id: UserId,
        request: CreateTransactionRequest,
        ctx: &RequestContext,
    ) -> PaylinkResult<TransactionResponse> {
        request.validate_request()?;

        let transaction = self
            .transactions
            .create(NewTransaction {
                user_id,
                amount: request.amount,
                kind: request.kind,
                description: request.description,
            })
            .await?;
        info!(
            "Transaction {} recorded: {} {} for user {}",
            transaction.id, transaction.kind, transaction.amount, user_id
        );

        self.audit_log
            .record(
                AuditAction::TransactionCreated,
                user_id.to_string(),
                Some(json!({
                    "transaction_id": transaction.id,
                    "amount": transaction.amount,
                    "type": transaction.kind,
                })),
                ctx,
            )
            .await;

        Ok(TransactionResponse::from(transaction))
    }

    async fn list_transactions(
        &self,
        user_id: UserId,
        kind: Option<TransactionKind>,
    ) -> PaylinkResult<Vec<TransactionResponse>> {
        let filter = TransactionFilter::for_user(user_id).with_kind(kind);
        let transactions = self.transactions.find_all(filter).await?;
        Ok(transactions.into_iter().map(TransactionResponse::from).collect())
    }

    async fn get_balance(&self, user_id: UserId) -> PaylinkResult<BalanceResponse> {
        let amount = self.transactions.balance(user_id).await?;
        Ok(BalanceResponse { user_id, amount })
    }

    async fn delete_user_transactions(&self, user_id: UserId) -> PaylinkResult<DeletedTransactions> {
        let deleted_count = self.transactions.delete_by_user_id(user_id).await?;
        debug!("Deleted {} transactions for user {}", deleted_count, user_id);

        self.audit_log
            .record(
                AuditAction::TransactionsDeleted,
                user_id.to_string(),
                Some(json!({ "deleted_count": deleted_count })),
                &RequestContext::default(),
            )
            .await;

        Ok(DeletedTransactions {
            success: true,
            deleted_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paylink_core::PaylinkError;
    use paylink_repository::{InMemoryAuditLogRepository, InMemoryTransactionRepository};

    fn service() -> WalletServiceImpl {
        WalletServiceImpl::new(
            Arc::new(InMemoryTransactionRepository::new()),
            AuditLogService::new(Arc::new(InMemoryAuditLogRepository::new())),
        )
    }

    fn request(amount: i64, kind: TransactionKind) -> CreateTransactionRequest {
        CreateTransactionRequest {
            amount,
            kind,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amount() {
        let service = service();
        let ctx = RequestContext::default();
        let err = service
            .create_transaction(UserId::new(), request(0, TransactionKind::Credit), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, PaylinkError::Validation(_)));

        assert!(service
            .create_transaction(UserId::new(), request(-5, TransactionKind::Debit), &ctx)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_balance_and_listing() {
        let service = service();
        let user = UserId::new();
        let ctx = RequestContext::default();
        service
            .create_transaction(user, request(500, TransactionKind::Credit), &ctx)
            .await
            .unwrap();
        service
            .create_transaction(user, request(120, TransactionKind::Debit), &ctx)
            .await
            .unwrap();

        assert_eq!(service.get_balance(user).await.unwrap().amount, 380);
        assert_eq!(service.list_transactions(user, None).await.unwrap().len(), 2);
        assert_eq!(
            service
                .list_transactions(user, Some(TransactionKind::Credit))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_delete_user_transactions_reports_count() {
        let service = service();
        let user = UserId::new();
        let ctx = RequestContext::default();
        service
            .create_transaction(user, request(1, TransactionKind::Credit), &ctx)
            .await
            .unwrap();
        service
            .create_transaction(user, request(2, TransactionKind::Credit), &ctx)
            .await
            .unwrap();

        let result = service.delete_user_transactions(user).await.unwrap();
        assert_eq!(
            result,
            DeletedTransactions {
                success: true,
                deleted_count: 2
            }
        );
        assert_eq!(service.get_balance(user).await.unwrap().amount, 0);
    }
}
