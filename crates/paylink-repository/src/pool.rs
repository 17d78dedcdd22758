//! Database connection pool management.

use paylink_config::DatabaseConfig;
use paylink_core::{PaylinkError, PaylinkResult};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::sync::Arc;
use tracing::{info, warn};

/// MySQL pool wrapper.
pub struct DatabasePool {
    pool: MySqlPool,
}

impl DatabasePool {
    /// Connects using the pool settings in `config`.
    pub async fn connect(config: &DatabaseConfig) -> PaylinkResult<Self> {
        if config.url.is_empty() {
            return Err(PaylinkError::Configuration(
                "database.url is required for the mysql backend".to_string(),
            ));
        }

        info!("Connecting to MySQL database...");

        let pool = MySqlPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .idle_timeout(Some(config.idle_timeout()))
            .connect(&config.url)
            .await
            .map_err(|e| {
                warn!("Failed to connect to database: {}", e);
                PaylinkError::Database(format!("Failed to connect: {}", e))
            })?;

        info!("MySQL connection pool established");
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn with_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn inner(&self) -> &MySqlPool {
        &self.pool
    }

    /// Round-trips a trivial query.
    pub async fn health_check(&self) -> PaylinkResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| PaylinkError::Database(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Applies the embedded migrations.
    pub async fn run_migrations(&self) -> PaylinkResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PaylinkError::Database(format!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    pub async fn close(&self) {
        info!("Closing database connection pool...");
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

impl std::fmt::Debug for DatabasePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabasePool")
            .field("size", &self.pool.size())
            .field("num_idle", &self.pool.num_idle())
            .finish()
    }
}

/// Connects and wraps the pool for sharing.
pub async fn create_pool(config: &DatabaseConfig) -> PaylinkResult<Arc<DatabasePool>> {
    Ok(Arc::new(DatabasePool::connect(config).await?))
}
