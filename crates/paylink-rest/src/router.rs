//! Application routers for the two roles.

use crate::{
    controllers::{health_controller, transaction_controller, user_controller},
    middleware::{logging_middleware, rate_limit_middleware, RateLimitState},
    state::{HealthState, UsersState, WalletState},
};
use axum::{middleware, Router};
use paylink_config::{RateLimitConfig, ServerConfig};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Edge settings shared by both roles.
#[derive(Clone, Debug)]
pub struct RouterConfig {
    pub server: ServerConfig,
    pub rate_limit: Option<RateLimitState>,
}

impl RouterConfig {
    /// Builds the edge settings; rate limiting only when enabled.
    pub fn new(server: &ServerConfig, rate_limit: &RateLimitConfig) -> Self {
        Self {
            server: server.clone(),
            rate_limit: rate_limit
                .enabled
                .then(|| RateLimitState::from_config(rate_limit)),
        }
    }
}

/// Creates the users service router.
pub fn create_users_router(state: UsersState, health: HealthState, config: &RouterConfig) -> Router {
    let api = Router::new()
        .merge(user_controller::router(state.access_tokens.clone()))
        .with_state(state);

    info!("Users router created");
    with_edge_layers(api, health, config)
}

/// Creates the wallet service router.
pub fn create_wallet_router(state: WalletState, health: HealthState, config: &RouterConfig) -> Router {
    let api = Router::new()
        .merge(transaction_controller::router(state.access_tokens.clone()))
        .with_state(state);

    info!("Wallet router created");
    with_edge_layers(api, health, config)
}

/// Rate limits the API routes only, then merges health and applies the
/// layers every route shares.
fn with_edge_layers(api: Router, health: HealthState, config: &RouterConfig) -> Router {
    let api = match &config.rate_limit {
        Some(limits) => api.layer(middleware::from_fn_with_state(
            limits.clone(),
            rate_limit_middleware,
        )),
        None => api,
    };
    let router = api.merge(health_controller::router(health));

    let cors = if config.server.cors_enabled {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    router
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(logging_middleware))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
