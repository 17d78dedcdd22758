//! Configuration loader with layered sources.

use crate::{AppConfig, ConfigValidator, SecurityConfig};
use config::{Config, ConfigError, Environment, File};
use paylink_core::{PaylinkError, PaylinkResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable selecting the `{environment}.toml` overlay.
pub const ENVIRONMENT_VAR: &str = "PAYLINK_ENVIRONMENT";

/// Loads [`AppConfig`] from files and environment variables.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a loader reading from `config_dir`.
    ///
    /// Sources are applied in order, later ones overriding earlier ones:
    /// 1. `.env` in the working directory (exported into the process env)
    /// 2. `{config_dir}/default.toml`
    /// 3. `{config_dir}/{PAYLINK_ENVIRONMENT}.toml`
    /// 4. `{config_dir}/local.toml`
    /// 5. Environment variables with the `PAYLINK_` prefix and `__` separator
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Creates a loader for `./config`.
    #[must_use]
    pub fn from_default_location() -> Self {
        Self::new("./config")
    }

    /// Loads, deserializes, and validates the configuration.
    pub fn load(&self) -> PaylinkResult<AppConfig> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| "development".to_string());
        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();
        for name in ["default", environment.as_str(), "local"] {
            let path = self.config_dir.join(format!("{}.toml", name));
            if path.exists() {
                debug!("Loading config from: {}", path.display());
                builder = builder.add_source(File::from(path.as_path()).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("PAYLINK")
                .separator("__")
                .try_parsing(true),
        );

        let app_config: AppConfig = builder
            .build()
            .and_then(Config::try_deserialize::<AppConfig>)
            .map_err(config_error_to_paylink_error)?;

        Self::validate_config(&app_config)?;
        Ok(app_config)
    }

    /// Returns the directory this loader reads from.
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn validate_config(config: &AppConfig) -> PaylinkResult<()> {
        if config.app.is_production() {
            let defaults = SecurityConfig::default();
            for (label, secret, default) in [
                ("access token", &config.security.jwt_secret, &defaults.jwt_secret),
                (
                    "internal token",
                    &config.security.internal_jwt_secret,
                    &defaults.internal_jwt_secret,
                ),
            ] {
                if secret == default {
                    warn!("Using default {} secret in production! This is a security risk.", label);
                } else if secret.len() < ConfigValidator::RECOMMENDED_SECRET_LENGTH {
                    warn!(
                        "The {} secret is shorter than {} characters",
                        label,
                        ConfigValidator::RECOMMENDED_SECRET_LENGTH
                    );
                }
            }
            if !config.tls.enabled {
                warn!("gRPC mTLS is disabled in production");
            }
        }

        ConfigValidator::validate(config).map_err(|errors| {
            let message = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            PaylinkError::Configuration(message)
        })
    }
}

fn config_error_to_paylink_error(err: ConfigError) -> PaylinkError {
    PaylinkError::Configuration(err.to_string())
}
