//! Authentication service trait definition.

use crate::dto::{AuthResponse, LoginRequest, RequestContext};
use async_trait::async_trait;
use paylink_core::PaylinkResult;

/// End-user authentication.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchanges email and password for an access token.
    ///
    /// An unknown email and a wrong password fail the same way.
    async fn authenticate(
        &self,
        request: LoginRequest,
        ctx: &RequestContext,
    ) -> PaylinkResult<AuthResponse>;
}
