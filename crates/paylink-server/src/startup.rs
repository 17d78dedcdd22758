//! Process setup: logging, metrics, banners, and shutdown signals.

use metrics_exporter_prometheus::PrometheusBuilder;
use paylink_config::{AppConfig, ObservabilityConfig};
use paylink_core::{PaylinkError, PaylinkResult};
use std::net::SocketAddr;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// Builds the default filter directive from the configured level.
#[must_use]
pub fn default_filter(config: &ObservabilityConfig) -> String {
    format!("{},paylink=debug,tower_http=debug", config.log_level)
}

/// Installs the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &ObservabilityConfig) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(config)));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json_logs() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("Logging was already initialised: {}", e);
    }
}

/// Serves Prometheus metrics when enabled.
pub fn install_metrics_exporter(config: &ObservabilityConfig) -> PaylinkResult<()> {
    if !config.metrics_enabled {
        return Ok(());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| PaylinkError::Configuration(format!("Failed to start metrics exporter: {}", e)))?;
    info!("Prometheus metrics on http://{}/metrics", addr);
    Ok(())
}

/// Prints the startup banner.
pub fn print_banner(config: &AppConfig) {
    info!(
        "Starting {} v{} ({} role, {})",
        config.app.name, config.app.version, config.service.role, config.app.environment
    );
}

/// Prints where the process is listening.
pub fn print_startup_info(config: &AppConfig, grpc: bool) {
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("REST API:  http://{}", config.server.rest_addr());
    if grpc {
        info!("gRPC API:  http://{}", config.server.grpc_addr());
    }
    info!("Health:    http://{}/health", config.server.rest_addr());
    info!("{}", separator);
}

/// Resolves once the process should stop.
///
/// Clones observe the same trigger, so REST and gRPC servers stop together.
#[derive(Clone, Debug)]
pub struct Shutdown {
    receiver: watch::Receiver<bool>,
}

/// Fires a [`Shutdown`].
#[derive(Debug)]
pub struct ShutdownTrigger {
    sender: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Signals every clone of the paired [`Shutdown`].
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }
}

impl Shutdown {
    /// Creates a manually triggered shutdown.
    #[must_use]
    pub fn channel() -> (ShutdownTrigger, Self) {
        let (sender, receiver) = watch::channel(false);
        (ShutdownTrigger { sender }, Self { receiver })
    }

    /// Creates a shutdown triggered by Ctrl-C or SIGTERM.
    #[must_use]
    pub fn on_signal() -> Self {
        let (trigger, shutdown) = Self::channel();
        tokio::spawn(async move {
            shutdown_signal().await;
            trigger.trigger();
        });
        shutdown
    }

    /// Waits for the trigger.
    pub async fn wait(mut self) {
        // A dropped trigger also ends the wait.
        let _ = self.receiver.wait_for(|stop| *stop).await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
