//! Conversions between [`PaylinkError`] and [`tonic::Status`].

use paylink_core::PaylinkError;
use tonic::{Code, Status};
use tracing::error;

/// Maps a service failure onto the status returned to a gRPC caller.
pub fn to_status(err: PaylinkError) -> Status {
    match err {
        PaylinkError::NotFound { .. } => Status::not_found(err.to_string()),
        PaylinkError::Validation(msg) => Status::invalid_argument(msg),
        PaylinkError::Conflict(msg) => Status::already_exists(msg),
        PaylinkError::Unauthorized(_) | PaylinkError::InvalidToken(_) | PaylinkError::TokenExpired => {
            Status::unauthenticated(err.to_string())
        }
        PaylinkError::Forbidden(msg) => Status::permission_denied(msg),
        PaylinkError::RateLimitExceeded => Status::resource_exhausted(err.to_string()),
        PaylinkError::Timeout(msg) => Status::deadline_exceeded(msg),
        PaylinkError::CircuitBreakerOpen(_) => Status::unavailable(err.to_string()),
        other => {
            error!("gRPC error: {:?}", other);
            Status::internal(other.to_string())
        }
    }
}

/// Maps a status returned by the wallet onto a service failure.
///
/// The wallet rejecting our internal token is a fault between the services,
/// not the end user's, so auth codes surface as a bad gateway.
pub fn map_grpc_error(status: &Status) -> PaylinkError {
    let message = status.message().to_string();
    match status.code() {
        Code::NotFound => PaylinkError::NotFound {
            resource_type: "Resource",
            id: message,
        },
        Code::InvalidArgument | Code::OutOfRange | Code::FailedPrecondition => {
            PaylinkError::Validation(message)
        }
        Code::AlreadyExists => PaylinkError::Conflict(message),
        Code::DeadlineExceeded => PaylinkError::Timeout(message),
        _ => PaylinkError::external("wallet", format!("{:?}: {}", status.code(), message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_status_codes() {
        assert_eq!(to_status(PaylinkError::validation("empty")).code(), Code::InvalidArgument);
        assert_eq!(to_status(PaylinkError::forbidden("mismatch")).code(), Code::PermissionDenied);
        assert_eq!(to_status(PaylinkError::TokenExpired).code(), Code::Unauthenticated);
        assert_eq!(
            to_status(PaylinkError::Database("connection reset".to_string())).code(),
            Code::Internal
        );
        assert_eq!(to_status(PaylinkError::not_found("User", "1")).code(), Code::NotFound);
    }

    #[test]
    fn test_map_grpc_error() {
        assert!(matches!(
            map_grpc_error(&Status::invalid_argument("no")),
            PaylinkError::Validation(_)
        ));
        assert!(matches!(
            map_grpc_error(&Status::deadline_exceeded("slow")),
            PaylinkError::Timeout(_)
        ));

        let err = map_grpc_error(&Status::unavailable("down"));
        assert!(matches!(err, PaylinkError::ExternalService { ref service, .. } if service == "wallet"));
        assert_eq!(err.status_code(), 502);
    }

    #[test]
    fn test_wallet_auth_rejection_is_bad_gateway() {
        for status in [
            Status::unauthenticated("Invalid token signature"),
            Status::permission_denied("Token subject does not match user_id"),
        ] {
            let err = map_grpc_error(&status);
            assert!(
                matches!(err, PaylinkError::ExternalService { ref service, .. } if service == "wallet"),
                "{:?}",
                status.code()
            );
            assert_eq!(err.status_code(), 502);
        }
    }
}
