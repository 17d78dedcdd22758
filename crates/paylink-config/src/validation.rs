//! Configuration validation.
//!
//! Collects every problem in one pass so that a misconfigured deployment
//! fails at startup with the full list instead of one error at a time.

use crate::{AppConfig, StorageBackend};
use std::fmt;
use url::Url;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// A token secret is empty.
    EmptySecret { name: String },
    /// Port number is invalid (must be 1-65535).
    InvalidPort { name: String, value: u16 },
    /// REST and gRPC ports conflict.
    PortConflict { rest: u16, grpc: u16 },
    /// Pool size configuration is invalid (min must be <= max).
    InvalidPoolSize { min: u32, max: u32 },
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// A TLS file path is required when TLS is enabled.
    MissingTlsPath { name: String },
    /// Timeout value must be positive.
    NonPositiveTimeout { name: String, value: u64 },
    /// Backoff ceiling is below the base delay.
    BackoffCeilingBelowBase { base_ms: u64, max_ms: u64 },
    /// Breaker threshold must be at least one.
    ZeroBreakerThreshold,
    /// Rate limit quota must be at least one.
    ZeroRateLimit { name: String },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySecret { name } => write!(f, "{} must not be empty", name),
            Self::InvalidPort { name, value } => {
                write!(f, "Invalid port for {}: {} (must be 1-65535)", name, value)
            }
            Self::PortConflict { rest, grpc } => {
                write!(
                    f,
                    "REST port ({}) and gRPC port ({}) cannot be the same",
                    rest, grpc
                )
            }
            Self::InvalidPoolSize { min, max } => {
                write!(
                    f,
                    "Invalid pool size: min ({}) cannot be greater than max ({})",
                    min, max
                )
            }
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {} URL: {}", url_type, message)
            }
            Self::MissingTlsPath { name } => {
                write!(f, "tls.{} is required when TLS is enabled", name)
            }
            Self::NonPositiveTimeout { name, value } => {
                write!(f, "Timeout '{}' must be positive, got {}", name, value)
            }
            Self::BackoffCeilingBelowBase { base_ms, max_ms } => {
                write!(
                    f,
                    "wallet_client.retry_max_delay_ms ({}) must be >= retry_base_delay_ms ({})",
                    max_ms, base_ms
                )
            }
            Self::ZeroBreakerThreshold => {
                write!(f, "wallet_client.circuit_breaker_threshold must be at least 1")
            }
            Self::ZeroRateLimit { name } => write!(f, "rate_limit.{} must be at least 1", name),
            Self::InvalidLogLevel { value } => {
                write!(
                    f,
                    "Invalid log level: '{}' (valid: trace, debug, info, warn, error)",
                    value
                )
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Secrets shorter than this trigger a warning in production.
    pub const RECOMMENDED_SECRET_LENGTH: usize = 32;
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        Self::validate_security(config, &mut errors);
        Self::validate_server(config, &mut errors);
        Self::validate_database(config, &mut errors);
        Self::validate_wallet_client(config, &mut errors);
        Self::validate_rate_limit(config, &mut errors);
        Self::validate_observability(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_security(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let security = &config.security;
        for (name, secret) in [
            ("security.jwt_secret", &security.jwt_secret),
            ("security.internal_jwt_secret", &security.internal_jwt_secret),
        ] {
            if secret.trim().is_empty() {
                errors.push(ConfigValidationError::EmptySecret {
                    name: name.to_string(),
                });
            }
        }
        for (name, ttl) in [
            ("security.access_token_ttl_secs", security.access_token_ttl_secs),
            ("security.internal_token_ttl_secs", security.internal_token_ttl_secs),
        ] {
            if ttl == 0 {
                errors.push(ConfigValidationError::NonPositiveTimeout {
                    name: name.to_string(),
                    value: 0,
                });
            }
        }

        let tls = &config.tls;
        if tls.enabled {
            for (name, value) in [
                ("ca_cert_path", &tls.ca_cert_path),
                ("cert_path", &tls.cert_path),
                ("key_path", &tls.key_path),
                ("domain_name", &tls.domain_name),
            ] {
                if value.trim().is_empty() {
                    errors.push(ConfigValidationError::MissingTlsPath {
                        name: name.to_string(),
                    });
                }
            }
        }
    }

    fn validate_server(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let server = &config.server;
        if server.rest_port == 0 {
            errors.push(ConfigValidationError::InvalidPort {
                name: "rest_port".to_string(),
                value: server.rest_port,
            });
        }
        if server.grpc_port == 0 {
            errors.push(ConfigValidationError::InvalidPort {
                name: "grpc_port".to_string(),
                value: server.grpc_port,
            });
        }
        if server.rest_host == server.grpc_host && server.rest_port == server.grpc_port {
            errors.push(ConfigValidationError::PortConflict {
                rest: server.rest_port,
                grpc: server.grpc_port,
            });
        }
        if server.request_timeout_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "server.request_timeout_secs".to_string(),
                value: 0,
            });
        }
    }

    fn validate_database(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let database = &config.database;
        if database.backend != StorageBackend::Mysql {
            return;
        }

        if database.url.is_empty() {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        } else if !database.url.starts_with("mysql://") {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL must start with mysql://".to_string(),
            });
        }

        if database.min_connections > database.max_connections {
            errors.push(ConfigValidationError::InvalidPoolSize {
                min: database.min_connections,
                max: database.max_connections,
            });
        }
        if database.connect_timeout_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "database.connect_timeout_secs".to_string(),
                value: 0,
            });
        }
    }

    fn validate_wallet_client(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let client = &config.wallet_client;

        if let Err(e) = Url::parse(&client.url) {
            errors.push(ConfigValidationError::InvalidUrl {
                url_type: "wallet_client".to_string(),
                message: e.to_string(),
            });
        }
        if client.timeout_ms == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "wallet_client.timeout_ms".to_string(),
                value: 0,
            });
        }
        if client.retry_max_delay_ms < client.retry_base_delay_ms {
            errors.push(ConfigValidationError::BackoffCeilingBelowBase {
                base_ms: client.retry_base_delay_ms,
                max_ms: client.retry_max_delay_ms,
            });
        }
        if client.circuit_breaker_threshold == 0 {
            errors.push(ConfigValidationError::ZeroBreakerThreshold);
        }
        if client.circuit_breaker_reset_ms == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "wallet_client.circuit_breaker_reset_ms".to_string(),
                value: 0,
            });
        }
    }

    fn validate_rate_limit(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let limits = &config.rate_limit;
        if !limits.enabled {
            return;
        }
        if limits.global_per_minute == 0 {
            errors.push(ConfigValidationError::ZeroRateLimit {
                name: "global_per_minute".to_string(),
            });
        }
        if limits.user_creation_per_window == 0 {
            errors.push(ConfigValidationError::ZeroRateLimit {
                name: "user_creation_per_window".to_string(),
            });
        }
        if limits.user_creation_window_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "rate_limit.user_creation_window_secs".to_string(),
                value: 0,
            });
        }
    }

    fn validate_observability(config: &AppConfig, errors: &mut Vec<ConfigValidationError>) {
        let level = config.observability.log_level.to_ascii_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(ConfigValidationError::InvalidLogLevel {
                value: config.observability.log_level.clone(),
            });
        }
    }
}
