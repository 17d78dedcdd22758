//! Authentication service implementation.

use crate::audit_log_service::AuditLogService;
use crate::auth_service::AuthService;
use crate::dto::{AuthResponse, LoginRequest, RequestContext, UserResponse};
use async_trait::async_trait;
use paylink_core::{PaylinkError, PaylinkResult, ValidateExt};
use paylink_repository::{AuditAction, UserRepository};
use paylink_security::{AccessTokenProvider, PasswordHasher};
use std::sync::Arc;
use tracing::{debug, info, warn};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub struct AuthServiceImpl {
    user_repository: Arc<dyn UserRepository>,
    password_hasher: Arc<PasswordHasher>,
    token_provider: Arc<AccessTokenProvider>,
    audit_log: AuditLogService,
}

impl AuthServiceImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        password_hasher: Arc<PasswordHasher>,
        token_provider: Arc<AccessTokenProvider>,
        audit_log: AuditLogService,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
            token_provider,
            audit_log,
        }
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn authenticate(
        &self,
        request: LoginRequest,
        ctx: &RequestContext,
    ) -> PaylinkResult<AuthResponse> {
        debug!("Login attempt for: {}", request.email);

        request.validate_request()?;

        let user = self
            .user_repository
            .find_by_email(request.email.trim())
            .await?
            .ok_or_else(|| {
                warn!("Login failed: unknown email {}", request.email);
                PaylinkError::unauthorized(INVALID_CREDENTIALS)
            })?;

        if !self
            .password_hasher
            .verify(&request.password, &user.password_hash)?
        {
            warn!("Login failed: invalid password for {}", user.id);
            return Err(PaylinkError::unauthorized(INVALID_CREDENTIALS));
        }

        let token = self.token_provider.issue(user.id, &user.email)?;
        info!("User authenticated: {}", user.id);

        self.audit_log
            .record(AuditAction::UserAuthenticated, user.id.to_string(), None, ctx)
            .await;

        Ok(AuthResponse {
            user: UserResponse::from(user),
            access_token: token.access_token,
            token_type: token.token_type,
            expires_at: token.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paylink_repository::{
        AuditLogRepository, InMemoryAuditLogRepository, InMemoryUserRepository, NewUser,
    };
    use std::time::Duration;

    struct Fixture {
        service: AuthServiceImpl,
        tokens: Arc<AccessTokenProvider>,
        audit: Arc<InMemoryAuditLogRepository>,
    }

    async fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        let hasher = Arc::new(PasswordHasher::fast());
        users
            .create(NewUser {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                password_hash: hasher.hash("correct horse").unwrap(),
            })
            .await
            .unwrap();

        let tokens = Arc::new(AccessTokenProvider::new(
            "test-access-secret",
            Duration::from_secs(600),
        ));
        let audit = Arc::new(InMemoryAuditLogRepository::new());
        let service = AuthServiceImpl::new(
            users,
            hasher,
            tokens.clone(),
            AuditLogService::new(audit.clone()),
        );
        Fixture {
            service,
            tokens,
            audit,
        }
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_authenticate_issues_token_for_user() {
        let f = fixture().await;
        let ctx = RequestContext::new(Some("198.51.100.4".to_string()), None);

        let response = f
            .service
            .authenticate(login("ada@example.com", "correct horse"), &ctx)
            .await
            .unwrap();

        assert_eq!(response.user.email, "ada@example.com");
        assert_eq!(response.token_type, "Bearer");
        let claims = f.tokens.verify(&response.access_token).unwrap();
        assert_eq!(claims.user_id().unwrap(), response.user.id);

        let entries = f
            .audit
            .find_by_user(&response.user.id.to_string())
            .await
            .unwrap();
        assert_eq!(entries[0].action, "USER_AUTHENTICATED");
        assert_eq!(entries[0].ip_address.as_deref(), Some("198.51.100.4"));
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let f = fixture().await;

        let err = f
            .service
            .authenticate(login("ada@example.com", "wrong horse"), &RequestContext::default())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 401);
        assert_eq!(err.to_string(), "Unauthorized: Invalid credentials");
    }

    #[tokio::test]
    async fn test_unknown_email_matches_wrong_password() {
        let f = fixture().await;

        let unknown = f
            .service
            .authenticate(login("nobody@example.com", "correct horse"), &RequestContext::default())
            .await
            .unwrap_err();
        let wrong = f
            .service
            .authenticate(login("ada@example.com", "wrong horse"), &RequestContext::default())
            .await
            .unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_malformed_login_is_validation_error() {
        let f = fixture().await;
        let err = f
            .service
            .authenticate(login("not-an-email", "x"), &RequestContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PaylinkError::Validation(_)));
    }
}
