//! Wallet transaction controller.
//!
//! Every route acts on the subject of the caller's access token.

use crate::{
    extractors::{AuthenticatedUser, ClientInfo, IdempotencyKey, ValidatedJson},
    idempotency::{run_idempotent, RequestFingerprint},
    middleware::auth_middleware,
    responses::{ok, ApiResponse, ApiResult, AppError},
    state::WalletState,
};
use axum::{
    extract::{Query, State},
    middleware,
    response::Response,
    routing::get,
    Router,
};
use paylink_security::AccessTokenProvider;
use paylink_service::{
    BalanceResponse, CreateTransactionRequest, HandlerOutcome, TransactionQuery,
    TransactionResponse,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Creates the transaction router.
pub fn router(access_tokens: Arc<AccessTokenProvider>) -> Router<WalletState> {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/balance", get(get_balance))
        .route_layer(middleware::from_fn_with_state(access_tokens, auth_middleware))
}

/// Record a credit or debit. Idempotent per key under
/// `transactions:create:<user_id>`.
async fn create_transaction(
    State(state): State<WalletState>,
    caller: AuthenticatedUser,
    ClientInfo(ctx): ClientInfo,
    key: IdempotencyKey,
    ValidatedJson(request): ValidatedJson<CreateTransactionRequest>,
) -> Result<Response, AppError> {
    let user_id = caller.user_id;
    debug!("Create transaction request for user {}", user_id);

    let fingerprint = RequestFingerprint {
        params: &json!({ "user_id": user_id }),
        body: &request.clone(),
    };
    let service = state.wallet_service.clone();
    run_idempotent(
        &state.idempotency,
        key,
        format!("transactions:create:{}", user_id),
        &fingerprint,
        move || async move {
            let transaction = service.create_transaction(user_id, request, &ctx).await?;
            Ok(HandlerOutcome::created(ApiResponse::success(transaction)))
        },
    )
    .await
}

/// List the caller's transactions, optionally filtered by `?type=CREDIT|DEBIT`.
async fn list_transactions(
    State(state): State<WalletState>,
    caller: AuthenticatedUser,
    Query(query): Query<TransactionQuery>,
) -> ApiResult<Vec<TransactionResponse>> {
    ok(state
        .wallet_service
        .list_transactions(caller.user_id, query.kind)
        .await?)
}

/// Credits minus debits for the caller.
async fn get_balance(
    State(state): State<WalletState>,
    caller: AuthenticatedUser,
) -> ApiResult<BalanceResponse> {
    ok(state.wallet_service.get_balance(caller.user_id).await?)
}
