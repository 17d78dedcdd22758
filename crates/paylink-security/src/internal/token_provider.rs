//! Issues and verifies internal service-to-service tokens.

use super::{InternalClaims, INTERNAL_TOKEN_AUDIENCE, INTERNAL_TOKEN_ISSUER, INTERNAL_TOKEN_TTL_SECS};
use crate::token_error::rejection;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use paylink_config::SecurityConfig;
use paylink_core::{PaylinkError, PaylinkResult};
use std::time::Duration;
use tracing::{debug, warn};

/// Signs and checks HS256 internal tokens with a shared secret.
///
/// Tokens are never cached: callers mint one per outbound call.
#[derive(Clone)]
pub struct InternalTokenProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl InternalTokenProvider {
    /// Creates a provider for `secret` with the default five minute lifetime.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Duration::from_secs(INTERNAL_TOKEN_TTL_SECS))
    }

    /// Creates a provider with a custom token lifetime.
    #[must_use]
    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[INTERNAL_TOKEN_ISSUER]);
        validation.set_audience(&[INTERNAL_TOKEN_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.validate_exp = true;
        validation.leeway = 0;

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
        Self::with_ttl(&config.internal_jwt_secret, config.internal_token_ttl())
    }

    /// Returns the token lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mints a token whose subject is `subject`.
    pub fn issue(&self, subject: &str) -> PaylinkResult<String> {
        if subject.trim().is_empty() {
            return Err(PaylinkError::validation("internal token subject must not be empty"));
        }

        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| PaylinkError::Configuration(format!("Invalid token lifetime: {}", e)))?;
        let now = Utc::now();
        let claims = InternalClaims::new(subject, now, now + ttl);

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| PaylinkError::Internal(format!("Failed to sign internal token: {}", e)))?;

        debug!("Issued internal token for subject {}", subject);
        Ok(token)
    }

    /// Verifies signature, issuer, audience, and expiry.
    pub fn verify(&self, token: &str) -> PaylinkResult<InternalClaims> {
        let token_data = decode::<InternalClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                warn!("Internal token rejected: {}", e);
                rejection(&e)
            })?;

        Ok(token_data.claims)
    }

    /// Verifies the token and checks that it was minted for `subject`.
    pub fn verify_for_subject(&self, token: &str, subject: &str) -> PaylinkResult<InternalClaims> {
        let claims = self.verify(token)?;
        ensure_subject_matches(&claims, subject)?;
        Ok(claims)
    }
}

impl std::fmt::Debug for InternalTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InternalTokenProvider")
            .field("issuer", &INTERNAL_TOKEN_ISSUER)
            .field("audience", &INTERNAL_TOKEN_AUDIENCE)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Rejects a token used to act on a subject other than the one it names.
pub fn ensure_subject_matches(claims: &InternalClaims, subject: &str) -> PaylinkResult<()> {
    if claims.is_for_subject(subject) {
        Ok(())
    } else {
        warn!(
            "Internal token subject {} does not match requested subject {}",
            claims.sub, subject
        );
        Err(PaylinkError::forbidden("token subject does not match requested user"))
    }
}

/// Mints a token for `subject` signed with `secret`.
pub fn issue_internal_token(subject: &str, secret: &str) -> PaylinkResult<String> {
    InternalTokenProvider::new(secret).issue(subject)
}

/// Verifies `token` against `secret`.
pub fn verify_internal_token(token: &str, secret: &str) -> PaylinkResult<InternalClaims> {
    InternalTokenProvider::new(secret).verify(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-internal-secret-for-testing-only";

    fn sign(claims: &InternalClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let provider = InternalTokenProvider::new(SECRET);
        let token = provider.issue("user-1").unwrap();

        let claims = provider.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.iss, "users");
        assert_eq!(claims.aud, "wallet");
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[test]
    fn test_each_token_is_unique() {
        let provider = InternalTokenProvider::new(SECRET);
        let first = provider.issue("user-1").unwrap();
        let second = provider.issue("user-1").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_free_functions() {
        let token = issue_internal_token("user-2", SECRET).unwrap();
        assert_eq!(verify_internal_token(&token, SECRET).unwrap().sub, "user-2");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_internal_token("user-1", SECRET).unwrap();
        let err = verify_internal_token(&token, "another-secret-entirely").unwrap_err();
        assert!(matches!(err, PaylinkError::InvalidToken(_)));
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let now = Utc::now();
        let mut claims = InternalClaims::new("user-1", now, now + chrono::Duration::minutes(5));
        claims.iss = "wallet".to_string();

        let err = verify_internal_token(&sign(&claims, SECRET), SECRET).unwrap_err();
        assert!(err.to_string().contains("issuer"));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let now = Utc::now();
        let mut claims = InternalClaims::new("user-1", now, now + chrono::Duration::minutes(5));
        claims.aud = "users".to_string();

        let err = verify_internal_token(&sign(&claims, SECRET), SECRET).unwrap_err();
        assert!(err.to_string().contains("audience"));
    }

    #[test]
    fn test_expired_rejected() {
        let now = Utc::now();
        let claims = InternalClaims::new(
            "user-1",
            now - chrono::Duration::minutes(10),
            now - chrono::Duration::minutes(5),
        );

        let err = verify_internal_token(&sign(&claims, SECRET), SECRET).unwrap_err();
        assert!(matches!(err, PaylinkError::TokenExpired));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(verify_internal_token("not.a.token", SECRET).is_err());
        assert!(verify_internal_token("", SECRET).is_err());
    }

    #[test]
    fn test_subject_mismatch_is_forbidden() {
        let provider = InternalTokenProvider::new(SECRET);
        let token = provider.issue("user-1").unwrap();

        assert!(provider.verify_for_subject(&token, "user-1").is_ok());

        let err = provider.verify_for_subject(&token, "user-2").unwrap_err();
        assert!(matches!(err, PaylinkError::Forbidden(_)));
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_empty_subject_refused() {
        let provider = InternalTokenProvider::new(SECRET);
        assert!(provider.issue(" ").is_err());
    }

    #[test]
    fn test_from_config_uses_ttl() {
        let config = SecurityConfig {
            internal_jwt_secret: SECRET.to_string(),
            internal_token_ttl_secs: 60,
            ..SecurityConfig::default()
        };
        let provider = InternalTokenProvider::from_config(&config);
        let claims = provider.verify(&provider.issue("u").unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, 60);
    }
}
