//! Access token claims.

use chrono::{DateTime, Utc};
use paylink_core::{PaylinkError, PaylinkResult, UserId};
use serde::{Deserialize, Serialize};

/// Issuer label stamped on every access token.
pub const ACCESS_TOKEN_ISSUER: &str = "paylink-users";
/// Audience label; both services accept access tokens.
pub const ACCESS_TOKEN_AUDIENCE: &str = "paylink";

/// Claims carried by an end-user access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the authenticated user's id.
    pub sub: String,
    /// Email the user authenticated with.
    pub email: String,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl AccessClaims {
    /// Creates claims for `user_id` expiring at `expires_at`.
    #[must_use]
    pub fn new(
        user_id: UserId,
        email: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: user_id.to_string(),
            email: email.into(),
            iss: ACCESS_TOKEN_ISSUER.to_string(),
            aud: ACCESS_TOKEN_AUDIENCE.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Parses the subject as a user id.
    pub fn user_id(&self) -> PaylinkResult<UserId> {
        UserId::parse(&self.sub)
            .map_err(|_| PaylinkError::InvalidToken("Token subject is not a user id".to_string()))
    }
}
