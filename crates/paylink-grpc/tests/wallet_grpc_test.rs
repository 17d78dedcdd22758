//! The users-side client against a real wallet gRPC server on loopback.

use paylink_config::{ServerConfig, WalletClientConfig};
use paylink_core::{PaylinkError, UserId};
use paylink_grpc::proto::wallet::{
    wallet_service_client::WalletServiceClient, DeleteUserTransactionsRequest,
};
use paylink_grpc::{resilience_config, GrpcWalletClient, WalletGrpcServer, WALLET_DEPENDENCY};
use paylink_repository::{
    InMemoryAuditLogRepository, InMemoryTransactionRepository, TransactionKind,
};
use paylink_resilience::{CircuitState, ResilientCaller};
use paylink_security::InternalTokenProvider;
use paylink_service::{
    AuditLogService, CreateTransactionRequest, RequestContext, WalletClient, WalletService,
    WalletServiceImpl,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tonic::{Code, Request};

const SECRET: &str = "loopback-secret";

struct Wallet {
    addr: SocketAddr,
    service: Arc<WalletServiceImpl>,
    _shutdown: oneshot::Sender<()>,
}

async fn start_wallet() -> Wallet {
    let service = Arc::new(WalletServiceImpl::new(
        Arc::new(InMemoryTransactionRepository::new()),
        AuditLogService::new(Arc::new(InMemoryAuditLogRepository::new())),
    ));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = WalletGrpcServer::new(
        &ServerConfig::default(),
        service.clone(),
        Arc::new(InternalTokenProvider::new(SECRET)),
    )
    .unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(server.serve_on(listener, async {
        rx.await.ok();
    }));

    Wallet {
        addr,
        service,
        _shutdown: tx,
    }
}

fn client_config(addr: SocketAddr) -> WalletClientConfig {
    WalletClientConfig {
        url: format!("http://{}", addr),
        retry_attempts: 0,
        retry_base_delay_ms: 0,
        retry_max_delay_ms: 0,
        circuit_breaker_threshold: 2,
        ..Default::default()
    }
}

fn wallet_client(config: &WalletClientConfig, secret: &str) -> GrpcWalletClient {
    GrpcWalletClient::connect_lazy(
        config,
        None,
        Arc::new(InternalTokenProvider::new(secret)),
        ResilientCaller::new(WALLET_DEPENDENCY, resilience_config(config)),
    )
    .unwrap()
}

async fn seed(service: &WalletServiceImpl, user: UserId, count: usize) {
    for _ in 0..count {
        service
            .create_transaction(
                user,
                CreateTransactionRequest {
                    amount: 100,
                    kind: TransactionKind::Credit,
                    description: None,
                },
                &RequestContext::default(),
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_client_deletes_a_users_transactions() {
    let wallet = start_wallet().await;
    let user = UserId::new();
    let other = UserId::new();
    seed(&wallet.service, user, 3).await;
    seed(&wallet.service, other, 1).await;

    let client = wallet_client(&client_config(wallet.addr), SECRET);
    let deleted = client.delete_user_transactions(user).await.unwrap();

    assert!(deleted.success);
    assert_eq!(deleted.deleted_count, 3);
    assert_eq!(wallet.service.get_balance(user).await.unwrap().amount, 0);
    assert_eq!(wallet.service.get_balance(other).await.unwrap().amount, 100);
}

#[tokio::test]
async fn test_wrong_secret_is_a_permanent_auth_failure() {
    let wallet = start_wallet().await;
    let config = client_config(wallet.addr);
    let client = wallet_client(&config, "not-the-wallet-secret");

    let err = client.delete_user_transactions(UserId::new()).await.unwrap_err();
    assert!(matches!(err, PaylinkError::ExternalService { ref service, .. } if service == "wallet"));
    assert_eq!(err.status_code(), 502);
}

#[tokio::test]
async fn test_missing_token_is_unauthenticated() {
    let wallet = start_wallet().await;
    let mut raw = WalletServiceClient::connect(format!("http://{}", wallet.addr))
        .await
        .unwrap();

    let status = raw
        .delete_user_transactions(DeleteUserTransactionsRequest {
            user_id: UserId::new().to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);
}

#[tokio::test]
async fn test_token_for_another_subject_is_denied() {
    let wallet = start_wallet().await;
    let victim = UserId::new();
    seed(&wallet.service, victim, 2).await;

    let token = InternalTokenProvider::new(SECRET)
        .issue(&UserId::new().to_string())
        .unwrap();
    let mut request = Request::new(DeleteUserTransactionsRequest {
        user_id: victim.to_string(),
    });
    request
        .metadata_mut()
        .insert("authorization", format!("Bearer {}", token).parse().unwrap());

    let mut raw = WalletServiceClient::connect(format!("http://{}", wallet.addr))
        .await
        .unwrap();
    let status = raw.delete_user_transactions(request).await.unwrap_err();

    assert_eq!(status.code(), Code::PermissionDenied);
    assert_eq!(wallet.service.get_balance(victim).await.unwrap().amount, 200);
}

#[tokio::test]
async fn test_unreachable_wallet_opens_the_breaker() {
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let client = wallet_client(&client_config(addr), SECRET);

    for _ in 0..2 {
        let err = client.delete_user_transactions(UserId::new()).await.unwrap_err();
        assert!(matches!(err, PaylinkError::ExternalService { .. }));
    }
    assert_eq!(client.caller().breaker().state(), CircuitState::Open);

    let err = client.delete_user_transactions(UserId::new()).await.unwrap_err();
    assert!(matches!(err, PaylinkError::CircuitBreakerOpen(ref name) if name == WALLET_DEPENDENCY));
    assert_eq!(err.status_code(), 503);
}
