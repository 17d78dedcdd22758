//! gRPC server setup for the wallet role.

use crate::interceptors::internal_auth_interceptor;
use crate::proto::wallet::wallet_service_server::WalletServiceServer;
use crate::services::WalletGrpcService;
use paylink_config::ServerConfig;
use paylink_core::{PaylinkError, PaylinkResult};
use paylink_security::InternalTokenProvider;
use paylink_service::WalletService;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Server, ServerTlsConfig};
use tracing::info;

/// Serves the wallet's internal API to the users service.
pub struct WalletGrpcServer {
    addr: SocketAddr,
    wallet_service: Arc<dyn WalletService>,
    token_provider: Arc<InternalTokenProvider>,
    tls: Option<ServerTlsConfig>,
}

impl WalletGrpcServer {
    /// Creates a new gRPC server bound to the configured address.
    pub fn new(
        config: &ServerConfig,
        wallet_service: Arc<dyn WalletService>,
        token_provider: Arc<InternalTokenProvider>,
    ) -> PaylinkResult<Self> {
        let addr = config.grpc_addr().parse().map_err(|e| {
            PaylinkError::Configuration(format!("Invalid gRPC address: {}", e))
        })?;

        Ok(Self {
            addr,
            wallet_service,
            token_provider,
            tls: None,
        })
    }

    /// Requires mTLS on every connection.
    #[must_use]
    pub fn with_tls(mut self, tls: Option<ServerTlsConfig>) -> Self {
        self.tls = tls;
        self
    }

    /// Returns the configured listen address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> PaylinkResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| PaylinkError::Internal(format!("Failed to bind gRPC {}: {}", self.addr, e)))?;
        self.serve_on(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> PaylinkResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        let local = listener.local_addr().unwrap_or(self.addr);
        info!("Starting wallet gRPC server on {}", local);

        let service = WalletServiceServer::with_interceptor(
            WalletGrpcService::new(self.wallet_service),
            internal_auth_interceptor(self.token_provider),
        );

        let mut builder = Server::builder();
        if let Some(tls) = self.tls {
            builder = builder
                .tls_config(tls)
                .map_err(|e| PaylinkError::Configuration(format!("Invalid gRPC TLS config: {}", e)))?;
            info!("gRPC server requires client certificates");
        }

        builder
            .add_service(service)
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
            .await
            .map_err(|e| PaylinkError::Internal(format!("gRPC server error: {}", e)))?;

        info!("Wallet gRPC server stopped");
        Ok(())
    }
}

impl std::fmt::Debug for WalletGrpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletGrpcServer")
            .field("addr", &self.addr)
            .field("tls", &self.tls.is_some())
            .finish_non_exhaustive()
    }
}
