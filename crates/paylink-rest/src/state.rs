//! Application state for Axum handlers.

use axum::extract::FromRef;
use paylink_config::IdempotencyConfig;
use paylink_repository::Repositories;
use paylink_security::AccessTokenProvider;
use paylink_service::{AuthService, IdempotencyService, UserService, WalletService};
use std::sync::Arc;

/// Idempotency settings shared by every mutating route.
#[derive(Clone, Debug)]
pub struct IdempotencyState {
    pub service: Arc<IdempotencyService>,
    pub max_key_length: usize,
}

impl IdempotencyState {
    /// Creates the state from the coordinator and key settings.
    pub fn new(service: Arc<IdempotencyService>, config: &IdempotencyConfig) -> Self {
        Self {
            service,
            max_key_length: config.max_key_length,
        }
    }
}

/// State of the users service routes.
#[derive(Clone)]
pub struct UsersState {
    pub user_service: Arc<dyn UserService>,
    pub auth_service: Arc<dyn AuthService>,
    pub access_tokens: Arc<AccessTokenProvider>,
    pub idempotency: IdempotencyState,
}

impl UsersState {
    /// Creates a new users state.
    pub fn new(
        user_service: Arc<dyn UserService>,
        auth_service: Arc<dyn AuthService>,
        access_tokens: Arc<AccessTokenProvider>,
        idempotency: IdempotencyState,
    ) -> Self {
        Self {
            user_service,
            auth_service,
            access_tokens,
            idempotency,
        }
    }
}

impl FromRef<UsersState> for IdempotencyState {
    fn from_ref(state: &UsersState) -> Self {
        state.idempotency.clone()
    }
}

/// State of the wallet service routes.
#[derive(Clone)]
pub struct WalletState {
    pub wallet_service: Arc<dyn WalletService>,
    pub access_tokens: Arc<AccessTokenProvider>,
    pub idempotency: IdempotencyState,
}

impl WalletState {
    /// Creates a new wallet state.
    pub fn new(
        wallet_service: Arc<dyn WalletService>,
        access_tokens: Arc<AccessTokenProvider>,
        idempotency: IdempotencyState,
    ) -> Self {
        Self {
            wallet_service,
            access_tokens,
            idempotency,
        }
    }
}

impl FromRef<WalletState> for IdempotencyState {
    fn from_ref(state: &WalletState) -> Self {
        state.idempotency.clone()
    }
}

/// State of the health routes.
#[derive(Clone, Debug)]
pub struct HealthState {
    pub service_name: &'static str,
    pub repositories: Repositories,
}
