//! Claim-then-commit deduplication of mutating requests.

use paylink_core::{PaylinkError, PaylinkResult};
use paylink_repository::{IdempotencyRepository, NewIdempotencyRecord};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const IDEMPOTENCY_REQUESTS_TOTAL: &str = "paylink_idempotency_requests_total";

/// Identifies one logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotentRequest {
    /// Client-supplied key.
    pub key: String,
    /// Server-chosen namespace, e.g. `users:update:<id>`.
    pub scope: String,
    /// Fingerprint of the semantically relevant payload.
    pub request_hash: String,
}

impl IdempotentRequest {
    pub fn new(
        key: impl Into<String>,
        scope: impl Into<String>,
        request_hash: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            scope: scope.into(),
            request_hash: request_hash.into(),
        }
    }
}

/// What a guarded handler produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOutcome<T> {
    pub status_code: u16,
    pub body: T,
}

impl<T> HandlerOutcome<T> {
    pub const fn new(status_code: u16, body: T) -> Self {
        Self { status_code, body }
    }

    pub const fn ok(body: T) -> Self {
        Self::new(200, body)
    }

    pub const fn created(body: T) -> Self {
        Self::new(201, body)
    }
}

/// Stored or fresh response for an idempotent request.
///
/// The body is always the JSON value that was persisted, so a replay and the
/// first response serialise identically.
#[derive(Debug, Clone, PartialEq)]
pub struct IdempotentResponse {
    pub status_code: u16,
    pub body: serde_json::Value,
    pub replayed: bool,
}

/// Runs handlers at most once per `(scope, key)` and replays their outcome.
#[derive(Clone)]
pub struct IdempotencyService {
    repository: Arc<dyn IdempotencyRepository>,
}

impl IdempotencyService {
    pub fn new(repository: Arc<dyn IdempotencyRepository>) -> Self {
        Self { repository }
    }

    /// Executes `handler` under the idempotency protocol.
    ///
    /// - empty key: `IdempotencyKeyMissing`
    /// - stored record with a different hash: `IdempotencyConflict`
    /// - stored record with an outcome: that outcome, `replayed = true`
    /// - stored record without an outcome, or a lost claim race:
    ///   `IdempotencyInProgress`
    ///
    /// A failed handler releases the claim so the key can be retried at once.
    pub async fn execute<T, F, Fut>(
        &self,
        request: IdempotentRequest,
        handler: F,
    ) -> PaylinkResult<IdempotentResponse>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = PaylinkResult<HandlerOutcome<T>>>,
    {
        let IdempotentRequest {
            key,
            scope,
            request_hash,
        } = request;

        if key.trim().is_empty() {
            record_outcome("missing_key");
            return Err(PaylinkError::IdempotencyKeyMissing);
        }

        if let Some(existing) = self.repository.find_by_key(&scope, &key).await? {
            if existing.request_hash != request_hash {
                warn!("Idempotency key reused with a different payload in scope {}", scope);
                record_outcome("conflict");
                return Err(PaylinkError::IdempotencyConflict { scope });
            }

            return match existing.status_code {
                Some(status_code) => {
                    debug!("Replaying stored response for scope {}", scope);
                    record_outcome("replayed");
                    Ok(IdempotentResponse {
                        status_code,
                        body: existing.response_body.unwrap_or(serde_json::Value::Null),
                        replayed: true,
                    })
                }
                None => {
                    record_outcome("in_progress");
                    Err(PaylinkError::IdempotencyInProgress { scope })
                }
            };
        }

        let claim = self
            .repository
            .create(NewIdempotencyRecord {
                key,
                scope: scope.clone(),
                request_hash,
            })
            .await
            .map_err(|e| {
                if matches!(e, PaylinkError::IdempotencyInProgress { .. }) {
                    record_outcome("in_progress");
                }
                e
            })?;

        let committed = match handler().await {
            Ok(outcome) => match serde_json::to_value(&outcome.body) {
                Ok(body) => self
                    .repository
                    .update_response(claim.id, outcome.status_code, Some(body.clone()))
                    .await
                    .map(|()| (outcome.status_code, body)),
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e),
        };

        match committed {
            Ok((status_code, body)) => {
                info!("Idempotent request executed in scope {}", scope);
                record_outcome("executed");
                Ok(IdempotentResponse {
                    status_code,
                    body,
                    replayed: false,
                })
            }
            Err(e) => {
                debug!("Releasing idempotency claim in scope {} after failure: {}", scope, e);
                if let Err(cleanup) = self.repository.delete(claim.id).await {
                    warn!(
                        "Failed to release idempotency claim in scope {}: {}",
                        scope, cleanup
                    );
                }
                record_outcome("failed");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for IdempotencyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdempotencyService").finish_non_exhaustive()
    }
}

fn record_outcome(outcome: &'static str) {
    metrics::counter!(IDEMPOTENCY_REQUESTS_TOTAL, "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use paylink_repository::InMemoryIdempotencyRepository;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn service() -> (IdempotencyService, Arc<InMemoryIdempotencyRepository>) {
        let repo = Arc::new(InMemoryIdempotencyRepository::new());
        (IdempotencyService::new(repo.clone()), repo)
    }

    fn request(key: &str, hash: &str) -> IdempotentRequest {
        IdempotentRequest::new(key, "users:create", hash)
    }

    #[tokio::test]
    async fn test_missing_key_rejected_without_running_handler() {
        let (service, _) = service();
        let calls = &AtomicU32::new(0);

        let err = service
            .execute(request("  ", "h"), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(HandlerOutcome::ok(json!({})))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PaylinkError::IdempotencyKeyMissing));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_first_execution_stores_outcome() {
        let (service, repo) = service();

        let response = service
            .execute(request("k1", "h"), || async {
                Ok(HandlerOutcome::created(json!({"id": "x"})))
            })
            .await
            .unwrap();

        assert_eq!(response.status_code, 201);
        assert_eq!(response.body, json!({"id": "x"}));
        assert!(!response.replayed);

        let stored = repo.find_by_key("users:create", "k1").await.unwrap().unwrap();
        assert_eq!(stored.status_code, Some(201));
    }

    #[tokio::test]
    async fn test_replay_skips_handler() {
        let (service, _) = service();
        let calls = &AtomicU32::new(0);
        let handler = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(HandlerOutcome::created(json!({"id": "x"})))
        };

        let first = service.execute(request("k1", "h"), handler).await.unwrap();
        let second = service.execute(request("k1", "h"), handler).await.unwrap();

        assert!(second.replayed);
        assert_eq!(second.status_code, first.status_code);
        assert_eq!(second.body, first.body);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_in_flight_record_reports_in_progress() {
        let (service, repo) = service();
        repo.create(NewIdempotencyRecord {
            key: "k1".to_string(),
            scope: "users:create".to_string(),
            request_hash: "h".to_string(),
        })
        .await
        .unwrap();

        let err = service
            .execute(request("k1", "h"), || async { Ok(HandlerOutcome::ok(())) })
            .await
            .unwrap_err();
        assert!(matches!(err, PaylinkError::IdempotencyInProgress { .. }));
    }

    #[tokio::test]
    async fn test_hash_mismatch_on_in_flight_record_is_conflict() {
        let (service, repo) = service();
        repo.create(NewIdempotencyRecord {
            key: "k1".to_string(),
            scope: "users:create".to_string(),
            request_hash: "h1".to_string(),
        })
        .await
        .unwrap();

        let err = service
            .execute(request("k1", "h2"), || async { Ok(HandlerOutcome::ok(())) })
            .await
            .unwrap_err();
        assert!(matches!(err, PaylinkError::IdempotencyConflict { .. }));
    }

    #[tokio::test]
    async fn test_unit_body_is_stored_as_null() {
        let (service, _) = service();
        let response = service
            .execute(request("k1", "h"), || async { Ok(HandlerOutcome::new(204, ())) })
            .await
            .unwrap();
        assert_eq!(response.body, serde_json::Value::Null);

        let replay = service
            .execute(request("k1", "h"), || async { Ok(HandlerOutcome::new(204, ())) })
            .await
            .unwrap();
        assert!(replay.replayed);
        assert_eq!(replay.status_code, 204);
        assert_eq!(replay.body, serde_json::Value::Null);
    }
}
