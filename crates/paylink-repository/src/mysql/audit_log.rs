//! MySQL audit log.

use super::parse_id;
use crate::entities::{AuditLogEntry, NewAuditLogEntry};
use crate::pool::DatabasePool;
use crate::traits::AuditLogRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paylink_core::{PaylinkError, PaylinkResult};
use sqlx::types::Json;
use sqlx::FromRow;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct MySqlAuditLogRepository {
    pool: Arc<DatabasePool>,
}

impl MySqlAuditLogRepository {
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditLogRow {
    id: String,
    user_id: String,
    action: String,
    resource: String,
    metadata: Option<Json<serde_json::Value>>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditLogRow> for AuditLogEntry {
    type Error = PaylinkError;

    fn try_from(row: AuditLogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&row.id)?,
            user_id: row.user_id,
            action: row.action,
            resource: row.resource,
            metadata: row.metadata.map(|Json(value)| value),
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl AuditLogRepository for MySqlAuditLogRepository {
    async fn create(&self, entry: NewAuditLogEntry) -> PaylinkResult<AuditLogEntry> {
        let entry = entry.into_entry();

        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, user_id, action, resource, metadata, ip_address, user_agent, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(&entry.user_id)
        .bind(&entry.action)
        .bind(&entry.resource)
        .bind(entry.metadata.clone().map(Json))
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.created_at)
        .execute(self.pool.inner())
        .await?;

        Ok(entry)
    }

    async fn find_by_user(&self, user_id: &str) -> PaylinkResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT id, user_id, action, resource, metadata, ip_address, user_agent, created_at
            FROM audit_logs
            WHERE user_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool.inner())
        .await?;

        rows.into_iter().map(AuditLogEntry::try_from).collect()
    }
}
