//! Access token authentication.

use crate::responses::AppError;
use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use paylink_core::{PaylinkError, PaylinkResult};
use paylink_security::{AccessClaims, AccessTokenProvider};
use std::sync::Arc;
use tracing::debug;

/// Verifies the bearer token and adds its claims to the request extensions.
///
/// Requests without a valid token are rejected with 401 before reaching the
/// handler.
pub async fn auth_middleware(
    State(token_provider): State<Arc<AccessTokenProvider>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&token_provider, request.headers()) {
        Ok(claims) => {
            debug!("Authenticated user: {}", claims.sub);
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            debug!("Authentication failed: {}", e);
            AppError(e).into_response()
        }
    }
}

fn authenticate(
    token_provider: &AccessTokenProvider,
    headers: &HeaderMap,
) -> PaylinkResult<AccessClaims> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| PaylinkError::unauthorized("Missing authorization header"))?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| PaylinkError::unauthorized("Invalid authorization format"))?;

    let claims = token_provider.verify(token)?;
    claims.user_id()?;
    Ok(claims)
}
