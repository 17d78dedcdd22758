//! Issues and verifies end-user access tokens.

use super::{AccessClaims, ACCESS_TOKEN_AUDIENCE, ACCESS_TOKEN_ISSUER};
use crate::token_error::rejection;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use paylink_config::SecurityConfig;
use paylink_core::{PaylinkError, PaylinkResult, UserId};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// A freshly issued access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken {
    /// The signed token.
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Expiration timestamp.
    pub expires_at: i64,
}

/// Signs and checks HS256 access tokens.
#[derive(Clone)]
pub struct AccessTokenProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl AccessTokenProvider {
    /// Creates a provider for `secret` whose tokens live for `ttl`.
    #[must_use]
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ACCESS_TOKEN_ISSUER]);
        validation.set_audience(&[ACCESS_TOKEN_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Creates a provider from configuration.
    #[must_use]
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(&config.jwt_secret, config.access_token_ttl())
    }

    /// Issues a token for an authenticated user.
    pub fn issue(&self, user_id: UserId, email: &str) -> PaylinkResult<AccessToken> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| PaylinkError::Configuration(format!("Invalid token lifetime: {}", e)))?;
        let now = Utc::now();
        let claims = AccessClaims::new(user_id, email, now, now + ttl);

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| PaylinkError::Internal(format!("Failed to sign access token: {}", e)))?;

        debug!("Issued access token for user {}", user_id);
        Ok(AccessToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_at: claims.exp,
        })
    }

    /// Verifies signature, issuer, audience, and expiry.
    pub fn verify(&self, token: &str) -> PaylinkResult<AccessClaims> {
        decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Access token rejected: {}", e);
                rejection(&e)
            })
    }
}

impl std::fmt::Debug for AccessTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenProvider")
            .field("issuer", &ACCESS_TOKEN_ISSUER)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InternalTokenProvider;

    const SECRET: &str = "test-access-secret-for-testing-only";

    fn provider() -> AccessTokenProvider {
        AccessTokenProvider::new(SECRET, Duration::from_secs(3600))
    }

    #[test]
    fn test_issue_and_verify() {
        let user = UserId::new();
        let token = provider().issue(user, "ada@example.com").unwrap();
        assert_eq!(token.token_type, "Bearer");

        let claims = provider().verify(&token.access_token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.exp, token.expires_at);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = provider().issue(UserId::new(), "a@b.co").unwrap();
        let other = AccessTokenProvider::new("a-different-secret", Duration::from_secs(60));

        let err = other.verify(&token.access_token).unwrap_err();
        assert!(matches!(err, PaylinkError::InvalidToken(_)));
    }

    #[test]
    fn test_expired_rejected() {
        let now = Utc::now();
        let claims = AccessClaims::new(
            UserId::new(),
            "a@b.co",
            now - chrono::Duration::hours(2),
            now - chrono::Duration::hours(1),
        );
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(provider().verify(&token), Err(PaylinkError::TokenExpired)));
    }

    #[test]
    fn test_internal_token_is_not_an_access_token() {
        let internal = InternalTokenProvider::new(SECRET).issue(&UserId::new().to_string()).unwrap();
        let err = provider().verify(&internal).unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn test_non_uuid_subject_is_invalid() {
        let mut claims = AccessClaims::new(UserId::new(), "a@b.co", Utc::now(), Utc::now());
        claims.sub = "not-a-uuid".to_string();
        assert!(matches!(claims.user_id(), Err(PaylinkError::InvalidToken(_))));
    }

    #[test]
    fn test_from_config_uses_access_settings() {
        let config = SecurityConfig {
            jwt_secret: SECRET.to_string(),
            access_token_ttl_secs: 120,
            ..SecurityConfig::default()
        };
        let provider = AccessTokenProvider::from_config(&config);
        let token = provider.issue(UserId::new(), "a@b.co").unwrap();
        let claims = provider.verify(&token.access_token).unwrap();
        assert_eq!(claims.exp - claims.iat, 120);
    }
}
