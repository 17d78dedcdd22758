//! Internal token claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer label stamped on every internal token.
pub const INTERNAL_TOKEN_ISSUER: &str = "users";
/// Audience label; only the wallet accepts internal tokens.
pub const INTERNAL_TOKEN_AUDIENCE: &str = "wallet";
/// Default lifetime of an internal token in seconds.
pub const INTERNAL_TOKEN_TTL_SECS: u64 = 300;

/// Claims carried by a service-to-service token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalClaims {
    /// Subject: the user the caller is acting on.
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
    /// Unique token id; no two calls share a token.
    pub jti: String,
}

impl InternalClaims {
    /// Creates claims for `subject` expiring at `expires_at`.
    #[must_use]
    pub fn new(subject: impl Into<String>, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: subject.into(),
            iss: INTERNAL_TOKEN_ISSUER.to_string(),
            aud: INTERNAL_TOKEN_AUDIENCE.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::now_v7().to_string(),
        }
    }

    /// Returns true if the token was minted for `subject`.
    #[must_use]
    pub fn is_for_subject(&self, subject: &str) -> bool {
        self.sub == subject
    }
}
