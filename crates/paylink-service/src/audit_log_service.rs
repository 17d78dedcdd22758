//! Best-effort audit logging.

use crate::dto::RequestContext;
use paylink_repository::{AuditAction, AuditLogRepository, NewAuditLogEntry};
use std::sync::Arc;
use tracing::{debug, warn};

/// Records mutations; never fails the caller.
#[derive(Clone)]
pub struct AuditLogService {
    repository: Arc<dyn AuditLogRepository>,
}

impl AuditLogService {
    pub fn new(repository: Arc<dyn AuditLogRepository>) -> Self {
        Self { repository }
    }

    /// Persists `entry`. Storage errors are logged and swallowed.
    pub async fn log(&self, entry: NewAuditLogEntry) {
        let action = entry.action;
        match self.repository.create(entry).await {
            Ok(stored) => debug!("Audit {} recorded for {}", action, stored.user_id),
            Err(e) => warn!("Failed to create audit log entry {}: {}", action, e),
        }
    }

    /// Records `action` on `user_id` with optional metadata and the caller's
    /// address and user agent.
    pub async fn record(
        &self,
        action: AuditAction,
        user_id: impl Into<String>,
        metadata: Option<serde_json::Value>,
        ctx: &RequestContext,
    ) {
        let mut entry = NewAuditLogEntry::new(action, user_id)
            .with_client(ctx.ip_address.clone(), ctx.user_agent.clone());
        entry.metadata = metadata;
        self.log(entry).await;
    }
}

impl std::fmt::Debug for AuditLogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogService").finish_non_exhaustive()
    }
}
