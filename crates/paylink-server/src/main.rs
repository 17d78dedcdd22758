//! # Paylink Server
//!
//! Runs one of the two services selected by `service.role`:
//! - **users**: REST user management; deletes wallet data over gRPC
//! - **wallet**: REST ledger plus the internal gRPC API

use paylink_config::ConfigLoader;
use paylink_server::app;
use paylink_server::startup::{init_logging, install_metrics_exporter, Shutdown};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match ConfigLoader::from_default_location().load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.observability);
    info!("Configuration loaded for role {}", config.service.role);

    if let Err(e) = install_metrics_exporter(&config.observability) {
        error!("Application error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = app::run(config, Shutdown::on_signal()).await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}
