//! Runs mutating handlers through the idempotency coordinator.

use crate::extractors::IdempotencyKey;
use crate::responses::AppError;
use crate::state::IdempotencyState;
use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use paylink_core::{PaylinkError, PaylinkResult};
use paylink_service::{create_request_hash, HandlerOutcome, IdempotentRequest};
use serde::Serialize;
use std::future::Future;
use tracing::debug;

/// Response header set when the body is a stored replay.
pub const IDEMPOTENT_REPLAYED_HEADER: &str = "idempotent-replayed";

/// What a mutating request is fingerprinted by: its body and path parameters.
#[derive(Debug, Serialize)]
pub struct RequestFingerprint<'a, B: Serialize, P: Serialize> {
    pub params: &'a P,
    pub body: &'a B,
}

/// Executes `handler` at most once for `(scope, key)` and renders the stored
/// outcome.
///
/// The coordinator runs on its own task so a client disconnect cannot drop
/// it between claiming the key and recording the outcome.
pub async fn run_idempotent<F, Fut, T>(
    idempotency: &IdempotencyState,
    key: IdempotencyKey,
    scope: String,
    fingerprint: &impl Serialize,
    handler: F,
) -> Result<Response, AppError>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = PaylinkResult<HandlerOutcome<T>>> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let request_hash = create_request_hash(fingerprint)?;
    let request = IdempotentRequest::new(key.0, scope, request_hash);
    let service = idempotency.service.clone();

    let outcome = tokio::spawn(async move { service.execute(request, handler).await })
        .await
        .map_err(|e| PaylinkError::internal(format!("Idempotent handler task failed: {}", e)))??;

    if outcome.replayed {
        debug!("Replaying stored response ({})", outcome.status_code);
    }

    let status = StatusCode::from_u16(outcome.status_code).unwrap_or(StatusCode::OK);
    let mut response = (status, Json(outcome.body)).into_response();
    if outcome.replayed {
        response
            .headers_mut()
            .insert(IDEMPOTENT_REPLAYED_HEADER, HeaderValue::from_static("true"));
    }
    Ok(response)
}
