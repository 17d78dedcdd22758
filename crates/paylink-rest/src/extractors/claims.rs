//! Authenticated user extractor.

use crate::responses::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use paylink_core::{PaylinkError, UserId};
use paylink_security::AccessClaims;

/// The caller behind a verified access token.
///
/// Reads the claims `auth_middleware` stored; rejects with 401 on routes the
/// middleware does not guard.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub claims: AccessClaims,
    pub user_id: UserId,
}

impl std::ops::Deref for AuthenticatedUser {
    type Target = AccessClaims;

    fn deref(&self) -> &Self::Target {
        &self.claims
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<AccessClaims>()
            .cloned()
            .ok_or_else(|| PaylinkError::unauthorized("Invalid or expired token"))?;
        let user_id = claims.user_id()?;
        Ok(Self { claims, user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use chrono::Utc;

    #[tokio::test]
    async fn test_reads_claims_from_extensions() {
        let user = UserId::new();
        let now = Utc::now();
        let claims = AccessClaims::new(user, "ada@example.com", now, now + chrono::Duration::minutes(5));

        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts.extensions.insert(claims);

        let extracted = AuthenticatedUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted.user_id, user);
        assert_eq!(extracted.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_unguarded_route_is_unauthorized() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let err = AuthenticatedUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.0.status_code(), 401);
    }
}
