//! Maps JWT decoding failures onto the error taxonomy.

use jsonwebtoken::errors::{Error, ErrorKind};
use paylink_core::PaylinkError;

pub(crate) fn rejection(e: &Error) -> PaylinkError {
    match e.kind() {
        ErrorKind::ExpiredSignature => PaylinkError::TokenExpired,
        ErrorKind::InvalidSignature => PaylinkError::InvalidToken("Invalid token signature".to_string()),
        ErrorKind::InvalidIssuer => PaylinkError::InvalidToken("Invalid token issuer".to_string()),
        ErrorKind::InvalidAudience => PaylinkError::InvalidToken("Invalid token audience".to_string()),
        _ => PaylinkError::InvalidToken(e.to_string()),
    }
}
