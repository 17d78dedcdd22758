//! Resilient gRPC client for the wallet service.

use crate::interceptors::AUTHORIZATION_HEADER;
use crate::proto::wallet::{self, wallet_service_client::WalletServiceClient};
use crate::status::map_grpc_error;
use async_trait::async_trait;
use paylink_config::WalletClientConfig;
use paylink_core::{PaylinkError, PaylinkResult, UserId};
use paylink_resilience::{
    CircuitBreakerConfig, Deadline, ResilienceConfig, ResilienceError,
    ResilientCaller, RetryPolicy,
};
use paylink_security::InternalTokenProvider;
use paylink_service::{DeletedTransactions, WalletClient};
use std::sync::Arc;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::{Request, Status};
use tracing::{debug, info, warn};

/// Name of the wallet dependency in breaker logs and errors.
pub const WALLET_DEPENDENCY: &str = "wallet";

/// Translates the client settings into composer settings.
#[must_use]
pub fn resilience_config(config: &WalletClientConfig) -> ResilienceConfig {
    ResilienceConfig {
        timeout: config.timeout(),
        retry: RetryPolicy {
            retries: config.retry_attempts,
            base_delay: config.retry_base_delay(),
            max_delay: config.retry_max_delay(),
        },
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: config.circuit_breaker_threshold,
            reset_timeout: config.circuit_breaker_reset(),
        },
    }
}

/// [`WalletClient`] backed by the wallet's gRPC API.
///
/// Every call runs through a [`ResilientCaller`]. The internal token for the
/// target user is minted once per call, before the breaker sees anything, and
/// each attempt carries the time left on the call's deadline as its gRPC
/// timeout.
#[derive(Clone)]
pub struct GrpcWalletClient {
    client: WalletServiceClient<Channel>,
    tokens: Arc<InternalTokenProvider>,
    caller: ResilientCaller,
}

impl GrpcWalletClient {
    /// Creates a client whose channel connects on first use.
    ///
    /// The users service can therefore start while the wallet is down.
    pub fn connect_lazy(
        config: &WalletClientConfig,
        tls: Option<ClientTlsConfig>,
        tokens: Arc<InternalTokenProvider>,
        caller: ResilientCaller,
    ) -> PaylinkResult<Self> {
        let mut endpoint = Endpoint::from_shared(config.url.clone()).map_err(|e| {
            PaylinkError::Configuration(format!("Invalid wallet url '{}': {}", config.url, e))
        })?;
        if let Some(tls) = tls {
            endpoint = endpoint.tls_config(tls).map_err(|e| {
                PaylinkError::Configuration(format!("Invalid wallet TLS config: {}", e))
            })?;
        }
        info!("Wallet client targeting {}", config.url);

        Ok(Self::from_channel(endpoint.connect_lazy(), tokens, caller))
    }

    /// Creates a client from an existing channel.
    pub fn from_channel(
        channel: Channel,
        tokens: Arc<InternalTokenProvider>,
        caller: ResilientCaller,
    ) -> Self {
        Self {
            client: WalletServiceClient::new(channel),
            tokens,
            caller,
        }
    }

    /// Returns the composer guarding this client.
    pub fn caller(&self) -> &ResilientCaller {
        &self.caller
    }

    fn authorized_request(
        &self,
        subject: &str,
        bearer: MetadataValue<Ascii>,
        deadline: Deadline,
    ) -> Request<wallet::DeleteUserTransactionsRequest> {
        let mut request = Request::new(wallet::DeleteUserTransactionsRequest {
            user_id: subject.to_string(),
        });
        request.metadata_mut().insert(AUTHORIZATION_HEADER, bearer);
        request.set_timeout(deadline.remaining(self.caller.clock()));
        request
    }
}

/// Renders `token` as an `authorization` metadata value.
fn bearer_metadata(token: &str) -> PaylinkResult<MetadataValue<Ascii>> {
    format!("Bearer {}", token)
        .parse()
        .map_err(|_| PaylinkError::internal("Internal token is not valid metadata"))
}

#[async_trait]
impl WalletClient for GrpcWalletClient {
    async fn delete_user_transactions(&self, user_id: UserId) -> PaylinkResult<DeletedTransactions> {
        let subject = user_id.to_string();
        debug!("Remote DeleteUserTransactions: {}", subject);

        let bearer = bearer_metadata(&self.tokens.issue(&subject)?)?;

        let response = self
            .caller
            .call(|deadline| {
                let mut client = self.client.clone();
                let request = self.authorized_request(&subject, bearer.clone(), deadline);
                async move {
                    client
                        .delete_user_transactions(request)
                        .await
                        .map(tonic::Response::into_inner)
                }
            })
            .await
            .map_err(map_resilience_error)?;

        Ok(DeletedTransactions {
            success: response.success,
            deleted_count: response.deleted_count,
        })
    }
}

impl std::fmt::Debug for GrpcWalletClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrpcWalletClient")
            .field("caller", &self.caller)
            .finish_non_exhaustive()
    }
}

/// Maps the composer's final failure onto a service error.
pub fn map_resilience_error(err: ResilienceError<Status>) -> PaylinkError {
    warn!("Wallet call failed: {}", err);
    match err {
        ResilienceError::CircuitOpen(name) => PaylinkError::CircuitBreakerOpen(name),
        ResilienceError::DeadlineExceeded(timeout) => PaylinkError::Timeout(format!(
            "{} call exceeded {:?}",
            WALLET_DEPENDENCY, timeout
        )),
        // Permanent codes keep their meaning; transient ones become ExternalService.
        ResilienceError::Failure(status) => map_grpc_error(&status),
    }
}
