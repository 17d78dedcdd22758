//! # Paylink Repository
//!
//! Persistence for both services behind async traits:
//!
//! ```text
//! Service
//!   ↓  Arc<dyn IdempotencyRepository | UserRepository | ...>
//! memory::*   (DashMap, single process)
//! mysql::*    (SQLx, shared across instances)
//! ```
//!
//! The idempotency store's `create` is the only concurrency control for
//! request deduplication: the DashMap entry API in memory, the
//! `(scope, idempotency_key)` unique key in MySQL.

pub mod entities;
pub mod memory;
pub mod mysql;
pub mod pool;
pub mod traits;

pub use entities::*;
pub use memory::*;
pub use mysql::*;
pub use pool::*;
pub use traits::*;

use paylink_config::{DatabaseConfig, StorageBackend};
use paylink_core::PaylinkResult;
use std::sync::Arc;
use tracing::info;

/// Every repository a service may need, built for one backend.
#[derive(Clone)]
pub struct Repositories {
    pub idempotency: Arc<dyn IdempotencyRepository>,
    pub users: Arc<dyn UserRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub audit_log: Arc<dyn AuditLogRepository>,
    /// Present for the MySQL backend; used by readiness checks and shutdown.
    pub pool: Option<Arc<DatabasePool>>,
}

impl Repositories {
    /// Process-local repositories.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            idempotency: Arc::new(InMemoryIdempotencyRepository::new()),
            users: Arc::new(InMemoryUserRepository::new()),
            transactions: Arc::new(InMemoryTransactionRepository::new()),
            audit_log: Arc::new(InMemoryAuditLogRepository::new()),
            pool: None,
        }
    }

    /// MySQL repositories sharing `pool`.
    #[must_use]
    pub fn mysql(pool: Arc<DatabasePool>) -> Self {
        Self {
            idempotency: Arc::new(MySqlIdempotencyRepository::new(pool.clone())),
            users: Arc::new(MySqlUserRepository::new(pool.clone())),
            transactions: Arc::new(MySqlTransactionRepository::new(pool.clone())),
            audit_log: Arc::new(MySqlAuditLogRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Builds repositories for the configured backend, migrating if asked.
    pub async fn from_config(config: &DatabaseConfig) -> PaylinkResult<Self> {
        match config.backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage");
                Ok(Self::in_memory())
            }
            StorageBackend::Mysql => {
                let pool = create_pool(config).await?;
                if config.run_migrations {
                    pool.run_migrations().await?;
                }
                Ok(Self::mysql(pool))
            }
        }
    }

    /// Checks the backing store is reachable.
    pub async fn health_check(&self) -> PaylinkResult<()> {
        match &self.pool {
            Some(pool) => pool.health_check().await,
            None => Ok(()),
        }
    }

    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
