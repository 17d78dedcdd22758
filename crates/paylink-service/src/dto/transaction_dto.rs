//! Ledger DTOs.

use chrono::{DateTime, Utc};
use paylink_core::{TransactionId, UserId};
use paylink_repository::{Transaction, TransactionKind};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to record a transaction. `amount` is in minor units.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    #[validate(range(min = 1, message = "Amount must be greater than zero"))]
    pub amount: i64,

    #[serde(rename = "type")]
    pub kind: TransactionKind,

    #[validate(length(max = 255))]
    pub description: Option<String>,
}

/// Query parameters for listing transactions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TransactionQuery {
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: TransactionId,
    pub user_id: UserId,
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            user_id: tx.user_id,
            amount: tx.amount,
            kind: tx.kind,
            description: tx.description,
            created_at: tx.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub user_id: UserId,
    pub amount: i64,
}

/// Outcome of wiping a user's ledger; mirrors the RPC response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedTransactions {
    pub success: bool,
    pub deleted_count: u64,
}
