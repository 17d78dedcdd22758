//! Per-client rate limiting.

use crate::responses::AppError;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use paylink_config::RateLimitConfig;
use paylink_resilience::RateLimiter;
use std::net::SocketAddr;
use tracing::warn;

/// Quotas enforced at the HTTP edge.
#[derive(Clone, Debug)]
pub struct RateLimitState {
    global: RateLimiter,
    user_creation: RateLimiter,
}

impl RateLimitState {
    /// Builds the global and user creation quotas.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            global: RateLimiter::per_minute(config.global_per_minute),
            user_creation: RateLimiter::per_window(
                config.user_creation_per_window,
                config.user_creation_window(),
            ),
        }
    }

    /// Drops state for clients whose quota has fully replenished.
    pub fn retain_recent(&self) {
        self.global.retain_recent();
        self.user_creation.retain_recent();
    }

    fn check(&self, client: &str, method: &Method, path: &str) -> Result<(), AppError> {
        self.global.check(client)?;
        if method == Method::POST && path.trim_end_matches('/') == "/users" {
            self.user_creation.check(client)?;
        }
        Ok(())
    }
}

/// Rejects requests over quota with 429.
///
/// Clients are keyed by peer address; requests without connection info share
/// one bucket.
pub async fn rate_limit_middleware(
    State(limits): State<RateLimitState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_string(), |ConnectInfo(addr)| addr.ip().to_string());

    if let Err(e) = limits.check(&client, request.method(), request.uri().path()) {
        warn!("Rate limit exceeded for {} on {}", client, request.uri().path());
        return e.into_response();
    }

    next.run(request).await
}
