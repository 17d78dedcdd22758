//! Composition root.
//!
//! Every shared instance (repositories, the idempotency coordinator, both
//! token providers, the password hasher, the wallet breaker) is built here
//! once and passed down explicitly.

use axum::Router;
use paylink_config::AppConfig;
use paylink_core::PaylinkResult;
use paylink_grpc::{
    client_tls_from_config, resilience_config, server_tls_from_config, GrpcWalletClient,
    WalletGrpcServer, WALLET_DEPENDENCY,
};
use paylink_repository::Repositories;
use paylink_resilience::ResilientCaller;
use paylink_rest::{
    create_users_router, create_wallet_router, HealthState, IdempotencyState, RouterConfig,
    UsersState, WalletState,
};
use paylink_security::{AccessTokenProvider, InternalTokenProvider, PasswordHasher};
use paylink_service::{
    AuditLogService, AuthService, AuthServiceImpl, IdempotencyService, UserService,
    UserServiceImpl, WalletClient, WalletService, WalletServiceImpl,
};
use std::sync::Arc;
use tracing::info;

/// Shared components for either role.
#[derive(Clone)]
pub struct AppContainer {
    config: AppConfig,
    repositories: Repositories,
    idempotency: Arc<IdempotencyService>,
    audit_log: AuditLogService,
    token_provider: Arc<InternalTokenProvider>,
    access_tokens: Arc<AccessTokenProvider>,
    password_hasher: Arc<PasswordHasher>,
    router_config: RouterConfig,
}

impl AppContainer {
    /// Connects the configured store and builds the shared components.
    pub async fn build(config: AppConfig) -> PaylinkResult<Self> {
        let repositories = Repositories::from_config(&config.database).await?;
        Ok(Self::with_repositories(config, repositories))
    }

    /// Builds the shared components over existing repositories.
    pub fn with_repositories(config: AppConfig, repositories: Repositories) -> Self {
        let idempotency = Arc::new(IdempotencyService::new(repositories.idempotency.clone()));
        let audit_log = AuditLogService::new(repositories.audit_log.clone());
        let token_provider = Arc::new(InternalTokenProvider::from_config(&config.security));
        let access_tokens = Arc::new(AccessTokenProvider::from_config(&config.security));
        let password_hasher = Arc::new(PasswordHasher::new());
        let router_config = RouterConfig::new(&config.server, &config.rate_limit);

        Self {
            config,
            repositories,
            idempotency,
            audit_log,
            token_provider,
            access_tokens,
            password_hasher,
            router_config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repositories
    }

    pub fn router_config(&self) -> &RouterConfig {
        &self.router_config
    }

    /// The resilient gRPC client the users service deletes wallet data through.
    pub fn wallet_client(&self) -> PaylinkResult<Arc<dyn WalletClient>> {
        let settings = &self.config.wallet_client;
        let caller = ResilientCaller::new(WALLET_DEPENDENCY, resilience_config(settings));
        let tls = client_tls_from_config(&self.config.tls)?;

        let client =
            GrpcWalletClient::connect_lazy(settings, tls, self.token_provider.clone(), caller)?;
        Ok(Arc::new(client))
    }

    pub fn user_service(&self, wallet_client: Arc<dyn WalletClient>) -> Arc<dyn UserService> {
        Arc::new(UserServiceImpl::new(
            self.repositories.users.clone(),
            wallet_client,
            self.password_hasher.clone(),
            self.audit_log.clone(),
        ))
    }

    pub fn auth_service(&self) -> Arc<dyn AuthService> {
        Arc::new(AuthServiceImpl::new(
            self.repositories.users.clone(),
            self.password_hasher.clone(),
            self.access_tokens.clone(),
            self.audit_log.clone(),
        ))
    }

    pub fn wallet_service(&self) -> Arc<dyn WalletService> {
        Arc::new(WalletServiceImpl::new(
            self.repositories.transactions.clone(),
            self.audit_log.clone(),
        ))
    }

    fn idempotency_state(&self) -> IdempotencyState {
        IdempotencyState::new(self.idempotency.clone(), &self.config.idempotency)
    }

    fn health_state(&self, service_name: &'static str) -> HealthState {
        HealthState {
            service_name,
            repositories: self.repositories.clone(),
        }
    }

    /// REST surface of the users role.
    pub fn users_router(&self, wallet_client: Arc<dyn WalletClient>) -> Router {
        let state = UsersState::new(
            self.user_service(wallet_client),
            self.auth_service(),
            self.access_tokens.clone(),
            self.idempotency_state(),
        );
        create_users_router(state, self.health_state("users"), &self.router_config)
    }

    /// REST surface of the wallet role.
    pub fn wallet_router(&self, wallet_service: Arc<dyn WalletService>) -> Router {
        let state = WalletState::new(
            wallet_service,
            self.access_tokens.clone(),
            self.idempotency_state(),
        );
        create_wallet_router(state, self.health_state("wallet"), &self.router_config)
    }

    /// Internal gRPC surface of the wallet role.
    pub fn wallet_grpc_server(
        &self,
        wallet_service: Arc<dyn WalletService>,
    ) -> PaylinkResult<WalletGrpcServer> {
        let tls = server_tls_from_config(&self.config.tls)?;
        if tls.is_some() {
            info!("Wallet gRPC requires mTLS");
        }
        Ok(WalletGrpcServer::new(
            &self.config.server,
            wallet_service,
            self.token_provider.clone(),
        )?
        .with_tls(tls))
    }
}

impl std::fmt::Debug for AppContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContainer")
            .field("role", &self.config.service.role)
            .field("repositories", &self.repositories)
            .finish_non_exhaustive()
    }
}
