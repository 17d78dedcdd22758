//! In-memory audit log.

use crate::entities::{AuditLogEntry, NewAuditLogEntry};
use crate::traits::AuditLogRepository;
use async_trait::async_trait;
use paylink_core::PaylinkResult;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryAuditLogRepository {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryAuditLogRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn create(&self, entry: NewAuditLogEntry) -> PaylinkResult<AuditLogEntry> {
        let entry = entry.into_entry();
        self.entries.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn find_by_user(&self, user_id: &str) -> PaylinkResult<Vec<AuditLogEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::AuditAction;

    #[tokio::test]
    async fn test_entries_are_kept_in_order() {
        let repo = InMemoryAuditLogRepository::new();
        repo.create(NewAuditLogEntry::new(AuditAction::UserCreated, "u1")).await.unwrap();
        repo.create(NewAuditLogEntry::new(AuditAction::UserCreated, "u2")).await.unwrap();
        repo.create(NewAuditLogEntry::new(AuditAction::UserDeleted, "u1")).await.unwrap();

        let actions: Vec<String> = repo
            .find_by_user("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, vec!["USER_CREATED", "USER_DELETED"]);
    }
}
