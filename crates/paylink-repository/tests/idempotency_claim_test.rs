//! Concurrency behaviour of the in-memory idempotency store.

use futures::future::join_all;
use paylink_core::PaylinkError;
use paylink_repository::{IdempotencyRepository, InMemoryIdempotencyRepository, NewIdempotencyRecord};
use std::sync::Arc;

fn claim(key: &str) -> NewIdempotencyRecord {
    NewIdempotencyRecord {
        key: key.to_string(),
        scope: "transactions:create:42".to_string(),
        request_hash: "hash".to_string(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_admit_exactly_one() {
    let repo = Arc::new(InMemoryIdempotencyRepository::new());

    let tasks = (0..32).map(|_| {
        let repo = repo.clone();
        tokio::spawn(async move { repo.create(claim("K1")).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    let in_progress = results
        .iter()
        .filter(|r| matches!(r, Err(PaylinkError::IdempotencyInProgress { .. })))
        .count();

    assert_eq!(winners, 1);
    assert_eq!(in_progress, 31);
    assert_eq!(repo.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_keys_do_not_contend() {
    let repo = Arc::new(InMemoryIdempotencyRepository::new());

    let tasks = (0..16).map(|i| {
        let repo = repo.clone();
        tokio::spawn(async move { repo.create(claim(&format!("K{i}"))).await })
    });

    for joined in join_all(tasks).await {
        assert!(joined.unwrap().is_ok());
    }
    assert_eq!(repo.len(), 16);
}

#[tokio::test]
async fn test_deleted_claim_can_be_reclaimed() {
    let repo = InMemoryIdempotencyRepository::new();
    let first = repo.create(claim("K1")).await.unwrap();
    repo.delete(first.id).await.unwrap();

    let second = repo.create(claim("K1")).await.unwrap();
    assert_ne!(first.id, second.id);

    // Deleting the stale id must not release the new claim.
    repo.delete(first.id).await.unwrap();
    assert!(repo.find_by_key("transactions:create:42", "K1").await.unwrap().is_some());
}
