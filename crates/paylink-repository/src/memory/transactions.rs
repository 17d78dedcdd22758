//! In-memory ledger.

use crate::entities::{NewTransaction, Transaction, TransactionFilter};
use crate::traits::TransactionRepository;
use async_trait::async_trait;
use dashmap::DashMap;
use paylink_core::{PaylinkResult, TransactionId, UserId};

#[derive(Debug, Default)]
pub struct InMemoryTransactionRepository {
    transactions: DashMap<TransactionId, Transaction>,
}

impl InMemoryTransactionRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn create(&self, transaction: NewTransaction) -> PaylinkResult<Transaction> {
        let transaction = transaction.into_transaction();
        self.transactions.insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn find_all(&self, filter: TransactionFilter) -> PaylinkResult<Vec<Transaction>> {
        let mut matching: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| filter.matches(t.value()))
            .map(|t| t.value().clone())
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(matching)
    }

    async fn find_by_id(&self, id: TransactionId) -> PaylinkResult<Option<Transaction>> {
        Ok(self.transactions.get(&id).map(|t| t.value().clone()))
    }

    async fn balance(&self, user_id: UserId) -> PaylinkResult<i64> {
        Ok(self
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.kind.signed(t.amount))
            .sum())
    }

    async fn delete_by_user_id(&self, user_id: UserId) -> PaylinkResult<u64> {
        let mut removed = 0u64;
        self.transactions.retain(|_, t| {
            if t.user_id == user_id {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }
}
