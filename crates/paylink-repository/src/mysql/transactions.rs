//! MySQL ledger implementation.

use super::parse_id;
use crate::entities::{NewTransaction, Transaction, TransactionFilter};
use crate::pool::DatabasePool;
use crate::traits::TransactionRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paylink_core::{PaylinkError, PaylinkResult, TransactionId, UserId};
use sqlx::{FromRow, MySql, QueryBuilder};
use std::sync::Arc;
use tracing::debug;

const TRANSACTION_COLUMNS: &str =
    "id, user_id, amount, kind, description, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct MySqlTransactionRepository {
    pool: Arc<DatabasePool>,
}

impl MySqlTransactionRepository {
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: String,
    user_id: String,
    amount: i64,
    kind: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = PaylinkError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&row.id)?,
            user_id: parse_id(&row.user_id)?,
            amount: row.amount,
            kind: row.kind.parse()?,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl TransactionRepository for MySqlTransactionRepository {
    async fn create(&self, transaction: NewTransaction) -> PaylinkResult<Transaction> {
        let transaction = transaction.into_transaction();

        sqlx::query(
            r#"
            INSERT INTO transactions (id, user_id, amount, kind, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(transaction.id.to_string())
        .bind(transaction.user_id.to_string())
        .bind(transaction.amount)
        .bind(transaction.kind.as_str())
        .bind(&transaction.description)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .execute(self.pool.inner())
        .await?;

        Ok(transaction)
    }

    async fn find_all(&self, filter: TransactionFilter) -> PaylinkResult<Vec<Transaction>> {
        let mut query: QueryBuilder<'_, MySql> =
            QueryBuilder::new(format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE 1 = 1"));
        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id.to_string());
        }
        if let Some(kind) = filter.kind {
            query.push(" AND kind = ").push_bind(kind.as_str());
        }
        query.push(" ORDER BY created_at DESC");

        let rows = query
            .build_query_as::<TransactionRow>()
            .fetch_all(self.pool.inner())
            .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    async fn find_by_id(&self, id: TransactionId) -> PaylinkResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(Transaction::try_from).transpose()
    }

    async fn balance(&self, user_id: UserId) -> PaylinkResult<i64> {
        // SUM over BIGINT yields DECIMAL; cast back so it decodes as i64.
        let balance: i64 = sqlx::query_scalar(
            r#"
            SELECT CAST(COALESCE(SUM(CASE WHEN kind = 'CREDIT' THEN amount ELSE -amount END), 0) AS SIGNED)
            FROM transactions
            WHERE user_id = ?
            "#,
        )
        .bind(user_id.to_string())
        .fetch_one(self.pool.inner())
        .await?;

        Ok(balance)
    }

    async fn delete_by_user_id(&self, user_id: UserId) -> PaylinkResult<u64> {
        let result = sqlx::query("DELETE FROM transactions WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(self.pool.inner())
            .await?;

        debug!("Deleted {} transactions for user {}", result.rows_affected(), user_id);
        Ok(result.rows_affected())
    }
}
