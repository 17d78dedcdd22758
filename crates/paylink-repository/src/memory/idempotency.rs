//! In-memory idempotency store.

use crate::entities::{IdempotencyRecord, NewIdempotencyRecord};
use crate::traits::IdempotencyRepository;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use paylink_core::{IdempotencyRecordId, PaylinkError, PaylinkResult};
use tracing::debug;

type ClaimKey = (String, String);

/// Idempotency store backed by a concurrent map.
///
/// Claims go through the map's entry API, which holds the shard lock across
/// the absent-check and the insert, so two racing claims for one
/// `(scope, key)` cannot both succeed.
#[derive(Debug, Default)]
pub struct InMemoryIdempotencyRepository {
    records: DashMap<ClaimKey, IdempotencyRecord>,
    by_id: DashMap<IdempotencyRecordId, ClaimKey>,
}

impl InMemoryIdempotencyRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, in flight or complete.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl IdempotencyRepository for InMemoryIdempotencyRepository {
    async fn find_by_key(&self, scope: &str, key: &str) -> PaylinkResult<Option<IdempotencyRecord>> {
        Ok(self
            .records
            .get(&(scope.to_string(), key.to_string()))
            .map(|r| r.value().clone()))
    }

    async fn create(&self, record: NewIdempotencyRecord) -> PaylinkResult<IdempotencyRecord> {
        let claim_key = (record.scope.clone(), record.key.clone());

        match self.records.entry(claim_key.clone()) {
            Entry::Occupied(_) => {
                debug!("Idempotency claim collided in scope {}", record.scope);
                Err(PaylinkError::IdempotencyInProgress {
                    scope: record.scope,
                })
            }
            Entry::Vacant(slot) => {
                let created = record.into_record();
                self.by_id.insert(created.id, claim_key);
                slot.insert(created.clone());
                Ok(created)
            }
        }
    }

    async fn update_response(
        &self,
        id: IdempotencyRecordId,
        status_code: u16,
        response_body: Option<serde_json::Value>,
    ) -> PaylinkResult<()> {
        let claim_key = self
            .by_id
            .get(&id)
            .map(|k| k.value().clone())
            .ok_or_else(|| PaylinkError::not_found("IdempotencyRecord", id))?;

        let mut record = self
            .records
            .get_mut(&claim_key)
            .ok_or_else(|| PaylinkError::not_found("IdempotencyRecord", id))?;
        record.status_code = Some(status_code);
        record.response_body = response_body;
        Ok(())
    }

    async fn delete(&self, id: IdempotencyRecordId) -> PaylinkResult<()> {
        if let Some((_, claim_key)) = self.by_id.remove(&id) {
            self.records.remove_if(&claim_key, |_, record| record.id == id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(key: &str) -> NewIdempotencyRecord {
        NewIdempotencyRecord {
            key: key.to_string(),
            scope: "users:create".to_string(),
            request_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let repo = InMemoryIdempotencyRepository::new();
        let created = repo.create(claim("k1")).await.unwrap();

        let found = repo.find_by_key("users:create", "k1").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(!found.is_complete());
        assert!(repo.find_by_key("users:update:1", "k1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_claim_is_in_progress() {
        let repo = InMemoryIdempotencyRepository::new();
        repo.create(claim("k1")).await.unwrap();

        let err = repo.create(claim("k1")).await.unwrap_err();
        assert!(matches!(err, PaylinkError::IdempotencyInProgress { .. }));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_same_key_in_other_scope_is_independent() {
        let repo = InMemoryIdempotencyRepository::new();
        repo.create(claim("k1")).await.unwrap();

        let other = NewIdempotencyRecord {
            scope: "users:delete:42".to_string(),
            ..claim("k1")
        };
        assert!(repo.create(other).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_response_completes_record() {
        let repo = InMemoryIdempotencyRepository::new();
        let created = repo.create(claim("k1")).await.unwrap();

        repo.update_response(created.id, 201, Some(serde_json::json!({"id": "x"})))
            .await
            .unwrap();

        let found = repo.find_by_key("users:create", "k1").await.unwrap().unwrap();
        assert_eq!(found.status_code, Some(201));
        assert_eq!(found.response_body, Some(serde_json::json!({"id": "x"})));
    }

    #[tokio::test]
    async fn test_update_unknown_record_fails() {
        let repo = InMemoryIdempotencyRepository::new();
        let err = repo
            .update_response(IdempotencyRecordId::new(), 200, None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_delete_releases_key() {
        let repo = InMemoryIdempotencyRepository::new();
        let created = repo.create(claim("k1")).await.unwrap();

        repo.delete(created.id).await.unwrap();
        assert!(repo.is_empty());
        assert!(repo.create(claim("k1")).await.is_ok());
    }
}
