//! Runs the configured role until shutdown.

use crate::di::AppContainer;
use crate::startup::{print_banner, print_startup_info, Shutdown};
use paylink_config::{AppConfig, ServiceRole};
use paylink_core::{PaylinkError, PaylinkResult};
use paylink_rest::RouterConfig;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// How often idle rate limit buckets are evicted.
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Builds the components for `config` and runs its role until `shutdown`.
pub async fn run(config: AppConfig, shutdown: Shutdown) -> PaylinkResult<()> {
    print_banner(&config);
    let role = config.service.role;
    let container = AppContainer::build(config).await?;

    spawn_rate_limit_cleanup(container.router_config(), shutdown.clone());

    let result = match role {
        ServiceRole::Users => run_users(&container, shutdown).await,
        ServiceRole::Wallet => run_wallet(&container, shutdown).await,
    };

    container.repositories().close().await;
    info!("Server shutdown complete");
    result
}

/// Users role: REST only, deleting wallet data through the resilient client.
pub async fn run_users(container: &AppContainer, shutdown: Shutdown) -> PaylinkResult<()> {
    let wallet_client = container.wallet_client()?;
    let router = container.users_router(wallet_client);

    print_startup_info(container.config(), false);
    serve_rest(&container.config().server.rest_addr(), router, shutdown).await
}

/// Wallet role: REST plus the internal gRPC API, concurrently.
pub async fn run_wallet(container: &AppContainer, shutdown: Shutdown) -> PaylinkResult<()> {
    let wallet_service = container.wallet_service();
    let router = container.wallet_router(wallet_service.clone());
    let grpc_server = container.wallet_grpc_server(wallet_service)?;

    print_startup_info(container.config(), true);
    let rest_addr = container.config().server.rest_addr();
    let rest = serve_rest(&rest_addr, router, shutdown.clone());
    let grpc = grpc_server.serve_with_shutdown(shutdown.wait());

    tokio::select! {
        result = rest => result,
        result = grpc => result,
    }
}

async fn serve_rest(addr: &str, router: axum::Router, shutdown: Shutdown) -> PaylinkResult<()> {
    info!("Starting REST server on http://{}", addr);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| PaylinkError::Internal(format!("Failed to bind REST {}: {}", addr, e)))?;

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.wait())
    .await
    .map_err(|e| PaylinkError::Internal(format!("REST server error: {}", e)))
}

fn spawn_rate_limit_cleanup(config: &RouterConfig, shutdown: Shutdown) {
    let Some(limits) = config.rate_limit.clone() else {
        return;
    };

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
        let stop = shutdown.wait();
        tokio::pin!(stop);
        loop {
            tokio::select! {
                () = &mut stop => break,
                _ = interval.tick() => {
                    limits.retain_recent();
                    debug!("Evicted idle rate limit buckets");
                }
            }
        }
    });
}
