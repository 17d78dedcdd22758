//! `Idempotency-Key` header extractor.

use crate::responses::AppError;
use crate::state::IdempotencyState;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use paylink_core::PaylinkError;

/// Header carrying the client's idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// The client-supplied key of a mutating request.
///
/// Rejects with 400 when the header is absent, blank, not visible ASCII, or
/// longer than the configured maximum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyKey(pub String);

impl IdempotencyKey {
    fn parse(raw: Option<&str>, max_length: usize) -> Result<Self, PaylinkError> {
        let key = raw.map(str::trim).unwrap_or_default();
        if key.is_empty() {
            return Err(PaylinkError::IdempotencyKeyMissing);
        }
        if key.len() > max_length {
            return Err(PaylinkError::validation(format!(
                "Idempotency-Key must be at most {} characters",
                max_length
            )));
        }
        Ok(Self(key.to_string()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for IdempotencyKey
where
    IdempotencyState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let settings = IdempotencyState::from_ref(state);
        let raw = match parts.headers.get(IDEMPOTENCY_KEY_HEADER) {
            Some(value) => Some(value.to_str().map_err(|_| {
                PaylinkError::validation("Idempotency-Key must be visible ASCII")
            })?),
            None => None,
        };
        Ok(Self::parse(raw, settings.max_key_length)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_blank_key() {
        assert!(matches!(
            IdempotencyKey::parse(None, 255),
            Err(PaylinkError::IdempotencyKeyMissing)
        ));
        assert!(matches!(
            IdempotencyKey::parse(Some("   "), 255),
            Err(PaylinkError::IdempotencyKeyMissing)
        ));
    }

    #[test]
    fn test_key_length_limit() {
        assert_eq!(
            IdempotencyKey::parse(Some(" K1 "), 2).unwrap(),
            IdempotencyKey("K1".to_string())
        );
        let err = IdempotencyKey::parse(Some("K123"), 3).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
