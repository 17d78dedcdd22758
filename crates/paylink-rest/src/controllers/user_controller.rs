//! User management and login controller.

use crate::{
    extractors::{AuthenticatedUser, ClientInfo, IdempotencyKey, ValidatedJson},
    idempotency::{run_idempotent, RequestFingerprint},
    middleware::auth_middleware,
    responses::{ok, ApiResponse, ApiResult, AppError},
    state::UsersState,
};
use axum::{
    extract::{Path, State},
    middleware,
    response::Response,
    routing::{get, post},
    Router,
};
use paylink_core::{PaylinkError, UserId};
use paylink_security::AccessTokenProvider;
use paylink_service::{
    AuthResponse, CreateUserRequest, DeleteUserResponse, HandlerOutcome, LoginRequest,
    UpdateUserRequest, UserResponse,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Creates the user router.
///
/// Signing up and logging in are public; everything else needs an access
/// token, and `/users/me` acts on the token's subject.
pub fn router(access_tokens: Arc<AccessTokenProvider>) -> Router<UsersState> {
    let auth = middleware::from_fn_with_state(access_tokens, auth_middleware);

    Router::new()
        .route("/auth", post(authenticate))
        .route(
            "/users",
            get(list_users).route_layer(auth.clone()).post(create_user),
        )
        .route(
            "/users/me",
            get(get_me)
                .patch(update_me)
                .delete(delete_me)
                .route_layer(auth.clone()),
        )
        .route("/users/:id", get(get_user).route_layer(auth))
}

/// Exchange email and password for an access token.
async fn authenticate(
    State(state): State<UsersState>,
    ClientInfo(ctx): ClientInfo,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<AuthResponse> {
    debug!("Login request: {}", request.email);
    ok(state.auth_service.authenticate(request, &ctx).await?)
}

/// List all users.
async fn list_users(
    State(state): State<UsersState>,
    _caller: AuthenticatedUser,
) -> ApiResult<Vec<UserResponse>> {
    debug!("List users request");
    ok(state.user_service.list_users().await?)
}

/// Create a user. Idempotent per key under `users:create`.
async fn create_user(
    State(state): State<UsersState>,
    ClientInfo(ctx): ClientInfo,
    key: IdempotencyKey,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<Response, AppError> {
    debug!("Create user request: {}", request.email);

    let fingerprint = RequestFingerprint {
        params: &json!({}),
        body: &request.clone(),
    };
    let service = state.user_service.clone();
    run_idempotent(
        &state.idempotency,
        key,
        "users:create".to_string(),
        &fingerprint,
        move || async move {
            let user = service.create_user(request, &ctx).await?;
            Ok(HandlerOutcome::created(ApiResponse::success(user)))
        },
    )
    .await
}

/// The caller's own profile.
async fn get_me(
    State(state): State<UsersState>,
    caller: AuthenticatedUser,
) -> ApiResult<UserResponse> {
    ok(state.user_service.get_user(caller.user_id).await?)
}

/// Get a user by ID.
async fn get_user(
    State(state): State<UsersState>,
    _caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<UserResponse> {
    debug!("Get user request: {}", id);
    let user_id = parse_user_id(&id)?;
    ok(state.user_service.get_user(user_id).await?)
}

/// Update the caller's profile. Idempotent per key under `users:update:<id>`.
async fn update_me(
    State(state): State<UsersState>,
    caller: AuthenticatedUser,
    ClientInfo(ctx): ClientInfo,
    key: IdempotencyKey,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<Response, AppError> {
    let user_id = caller.user_id;
    debug!("Update user request: {}", user_id);

    let fingerprint = RequestFingerprint {
        params: &json!({ "id": user_id }),
        body: &request.clone(),
    };
    let service = state.user_service.clone();
    run_idempotent(
        &state.idempotency,
        key,
        format!("users:update:{}", user_id),
        &fingerprint,
        move || async move {
            let user = service.update_user(user_id, request, &ctx).await?;
            Ok(HandlerOutcome::ok(ApiResponse::success(user)))
        },
    )
    .await
}

/// Delete the caller and their wallet history. Idempotent per key under
/// `users:delete:<id>`.
async fn delete_me(
    State(state): State<UsersState>,
    caller: AuthenticatedUser,
    ClientInfo(ctx): ClientInfo,
    key: IdempotencyKey,
) -> Result<Response, AppError> {
    let user_id = caller.user_id;
    debug!("Delete user request: {}", user_id);

    let fingerprint = RequestFingerprint {
        params: &json!({ "id": user_id }),
        body: &json!({}),
    };
    let service = state.user_service.clone();
    run_idempotent(
        &state.idempotency,
        key,
        format!("users:delete:{}", user_id),
        &fingerprint,
        move || async move {
            if !service.delete_user(user_id, &ctx).await? {
                return Err(PaylinkError::not_found("User", user_id));
            }
            Ok(HandlerOutcome::ok(ApiResponse::success(DeleteUserResponse {
                deleted: true,
            })))
        },
    )
    .await
}

/// Parses a path segment as a user id.
fn parse_user_id(id: &str) -> Result<UserId, AppError> {
    UserId::parse(id)
        .map_err(|_| AppError(PaylinkError::validation("Invalid user ID format")))
}
