//! Internal token interceptor for the wallet gRPC server.

use crate::status::to_status;
use paylink_security::{InternalClaims, InternalTokenProvider};
use std::sync::Arc;
use tonic::{Request, Status};
use tracing::{debug, warn};

/// Metadata key carrying the bearer token.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Rejects calls without a valid internal token.
///
/// Verified claims are stored in the request extensions for the handler's
/// subject check.
pub fn internal_auth_interceptor(
    token_provider: Arc<InternalTokenProvider>,
) -> impl Fn(Request<()>) -> Result<Request<()>, Status> + Clone {
    move |mut request: Request<()>| {
        let token = bearer_token(&request)?;
        let claims = token_provider.verify(token).map_err(to_status)?;
        debug!("gRPC: internal call for subject {}", claims.sub);
        request.extensions_mut().insert(claims);
        Ok(request)
    }
}

fn bearer_token<T>(request: &Request<T>) -> Result<&str, Status> {
    let header = request
        .metadata()
        .get(AUTHORIZATION_HEADER)
        .ok_or_else(|| {
            warn!("gRPC: missing internal token");
            Status::unauthenticated("Missing internal token")
        })?
        .to_str()
        .map_err(|_| Status::unauthenticated("Malformed authorization metadata"))?;

    header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            warn!("gRPC: malformed authorization metadata");
            Status::unauthenticated("Malformed authorization metadata")
        })
}

/// Returns the claims the interceptor verified for this request.
pub fn require_claims<T>(request: &Request<T>) -> Result<&InternalClaims, Status> {
    request
        .extensions()
        .get::<InternalClaims>()
        .ok_or_else(|| Status::unauthenticated("Authentication required"))
}
