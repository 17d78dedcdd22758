//! MySQL idempotency store.

use super::parse_id;
use crate::entities::{IdempotencyRecord, NewIdempotencyRecord};
use crate::pool::DatabasePool;
use crate::traits::IdempotencyRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paylink_core::{IdempotencyRecordId, PaylinkError, PaylinkResult};
use sqlx::types::Json;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

/// Idempotency store relying on `UNIQUE (scope, idempotency_key)`.
#[derive(Clone, Debug)]
pub struct MySqlIdempotencyRepository {
    pool: Arc<DatabasePool>,
}

impl MySqlIdempotencyRepository {
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct IdempotencyRow {
    id: String,
    idempotency_key: String,
    scope: String,
    request_hash: String,
    status_code: Option<u16>,
    response_body: Option<Json<serde_json::Value>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<IdempotencyRow> for IdempotencyRecord {
    type Error = PaylinkError;

    fn try_from(row: IdempotencyRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&row.id)?,
            key: row.idempotency_key,
            scope: row.scope,
            request_hash: row.request_hash,
            status_code: row.status_code,
            response_body: row.response_body.map(|Json(body)| body),
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl IdempotencyRepository for MySqlIdempotencyRepository {
    async fn find_by_key(&self, scope: &str, key: &str) -> PaylinkResult<Option<IdempotencyRecord>> {
        let row = sqlx::query_as::<_, IdempotencyRow>(
            r#"
            SELECT id, idempotency_key, scope, request_hash, status_code,
                   response_body, created_at
            FROM idempotency_keys
            WHERE scope = ? AND idempotency_key = ?
            "#,
        )
        .bind(scope)
        .bind(key)
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(IdempotencyRecord::try_from).transpose()
    }

    async fn create(&self, record: NewIdempotencyRecord) -> PaylinkResult<IdempotencyRecord> {
        let record = record.into_record();

        let inserted = sqlx::query(
            r#"
            INSERT INTO idempotency_keys (id, idempotency_key, scope, request_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.key)
        .bind(&record.scope)
        .bind(&record.request_hash)
        .bind(record.created_at)
        .execute(self.pool.inner())
        .await;

        match inserted {
            Ok(_) => Ok(record),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                debug!("Idempotency claim collided in scope {}", record.scope);
                Err(PaylinkError::IdempotencyInProgress {
                    scope: record.scope,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_response(
        &self,
        id: IdempotencyRecordId,
        status_code: u16,
        response_body: Option<serde_json::Value>,
    ) -> PaylinkResult<()> {
        // MySQL reports changed rows, not matched rows, so a zero count is not
        // proof the claim is gone.
        sqlx::query("UPDATE idempotency_keys SET status_code = ?, response_body = ? WHERE id = ?")
            .bind(status_code)
            .bind(response_body.map(Json))
            .bind(id.to_string())
            .execute(self.pool.inner())
            .await?;
        Ok(())
    }

    async fn delete(&self, id: IdempotencyRecordId) -> PaylinkResult<()> {
        sqlx::query("DELETE FROM idempotency_keys WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool.inner())
            .await?;
        Ok(())
    }
}
