//! Mutual TLS for the wallet gRPC channel.
//!
//! The wallet presents its certificate and requires a client certificate
//! signed by the shared CA. The users service verifies the wallet against the
//! same CA and presents its own certificate.

use paylink_config::TlsConfig;
use paylink_core::{PaylinkError, PaylinkResult};
use std::fs;
use tonic::transport::{Certificate, ClientTlsConfig, Identity, ServerTlsConfig};
use tracing::{debug, info};

/// PEM material loaded from a [`TlsConfig`].
#[derive(Clone)]
pub struct TlsMaterial {
    ca_cert: Vec<u8>,
    cert: Vec<u8>,
    key: Vec<u8>,
    domain_name: String,
}

impl TlsMaterial {
    /// Reads the CA, certificate, and key named by `config`.
    ///
    /// Returns `None` when mTLS is disabled.
    pub fn from_config(config: &TlsConfig) -> PaylinkResult<Option<Self>> {
        if !config.enabled {
            debug!("gRPC mTLS is disabled");
            return Ok(None);
        }

        let material = Self {
            ca_cert: read_file(&config.ca_cert_path, "CA certificate")?,
            cert: read_file(&config.cert_path, "certificate")?,
            key: read_file(&config.key_path, "private key")?,
            domain_name: config.domain_name.clone(),
        };
        info!("mTLS enabled with cert: {}", config.cert_path);
        Ok(Some(material))
    }

    /// Server side: own identity plus required client verification.
    #[must_use]
    pub fn server_config(&self) -> ServerTlsConfig {
        ServerTlsConfig::new()
            .identity(Identity::from_pem(&self.cert, &self.key))
            .client_ca_root(Certificate::from_pem(&self.ca_cert))
    }

    /// Client side: verify the wallet and present our own identity.
    #[must_use]
    pub fn client_config(&self) -> ClientTlsConfig {
        ClientTlsConfig::new()
            .ca_certificate(Certificate::from_pem(&self.ca_cert))
            .identity(Identity::from_pem(&self.cert, &self.key))
            .domain_name(self.domain_name.clone())
    }
}

impl std::fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("domain_name", &self.domain_name)
            .finish_non_exhaustive()
    }
}

/// Builds the wallet's server TLS config, or `None` when mTLS is disabled.
pub fn server_tls_from_config(config: &TlsConfig) -> PaylinkResult<Option<ServerTlsConfig>> {
    Ok(TlsMaterial::from_config(config)?.map(|m| m.server_config()))
}

/// Builds the users service's client TLS config, or `None` when mTLS is disabled.
pub fn client_tls_from_config(config: &TlsConfig) -> PaylinkResult<Option<ClientTlsConfig>> {
    Ok(TlsMaterial::from_config(config)?.map(|m| m.client_config()))
}

fn read_file(path: &str, description: &str) -> PaylinkResult<Vec<u8>> {
    fs::read(path).map_err(|e| {
        PaylinkError::Configuration(format!(
            "Failed to read {} from '{}': {}",
            description, path, e
        ))
    })
}
