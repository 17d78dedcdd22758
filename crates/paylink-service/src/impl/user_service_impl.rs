//! User service implementation.

use crate::audit_log_service::AuditLogService;
use crate::dto::{CreateUserRequest, RequestContext, UpdateUserRequest, UserResponse};
use crate::user_service::UserService;
use crate::wallet_client::WalletClient;
use async_trait::async_trait;
use paylink_core::{PaylinkError, PaylinkResult, UserId, ValidateExt};
use paylink_repository::{AuditAction, UserRepository};
use paylink_security::PasswordHasher;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

pub struct UserServiceImpl {
    user_repository: Arc<dyn UserRepository>,
    wallet_client: Arc<dyn WalletClient>,
    password_hasher: Arc<PasswordHasher>,
    audit_log: AuditLogService,
}

impl UserServiceImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        wallet_client: Arc<dyn WalletClient>,
        password_hasher: Arc<PasswordHasher>,
        audit_log: AuditLogService,
    ) -> Self {
        Self {
            user_repository,
            wallet_client,
            password_hasher,
            audit_log,
        }
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn create_user(
        &self,
        request: CreateUserRequest,
        ctx: &RequestContext,
    ) -> PaylinkResult<UserResponse> {
        debug!("Creating user: {}", request.email);

        request.validate_request()?;

        if self.user_repository.find_by_email(&request.email).await?.is_some() {
            return Err(PaylinkError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let password_hash = self.password_hasher.hash(&request.password)?;
        let user = self
            .user_repository
            .create(request.into_new_user(password_hash))
            .await?;
        info!("User created: {}", user.id);

        self.audit_log
            .record(
                AuditAction::UserCreated,
                user.id.to_string(),
                Some(json!({ "email": user.email })),
                ctx,
            )
            .await;

        Ok(UserResponse::from(user))
    }

    async fn get_user(&self, id: UserId) -> PaylinkResult<UserResponse> {
        debug!("Getting user: {}", id);

        let user = self
            .user_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| PaylinkError::not_found("User", id))?;

        Ok(UserResponse::from(user))
    }

    async fn list_users(&self) -> PaylinkResult<Vec<UserResponse>> {
        let users = self.user_repository.find_all().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    async fn update_user(
        &self,
        id: UserId,
        request: UpdateUserRequest,
        ctx: &RequestContext,
    ) -> PaylinkResult<UserResponse> {
        debug!("Updating user: {}", id);

        request.validate_request()?;

        let existing = self
            .user_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| PaylinkError::not_found("User", id))?;

        let password_hash = request
            .password
            .as_deref()
            .map(|password| self.password_hasher.hash(password))
            .transpose()?;
        let changes = request.into_changes(password_hash);
        if let Some(email) = &changes.email {
            if !email.eq_ignore_ascii_case(&existing.email)
                && self.user_repository.find_by_email(email).await?.is_some()
            {
                return Err(PaylinkError::Conflict("Email already in use".to_string()));
            }
        }

        let changed_fields: Vec<&str> = [
            changes.first_name.as_ref().map(|_| "first_name"),
            changes.last_name.as_ref().map(|_| "last_name"),
            changes.email.as_ref().map(|_| "email"),
            changes.password_hash.as_ref().map(|_| "password"),
        ]
        .into_iter()
        .flatten()
        .collect();

        let user = self
            .user_repository
            .update(id, changes)
            .await?
            .ok_or_else(|| PaylinkError::not_found("User", id))?;

        info!("User updated: {}", id);
        self.audit_log
            .record(
                AuditAction::UserUpdated,
                id.to_string(),
                Some(json!({ "fields": changed_fields })),
                ctx,
            )
            .await;

        Ok(UserResponse::from(user))
    }

    async fn delete_user(&self, id: UserId, ctx: &RequestContext) -> PaylinkResult<bool> {
        debug!("Deleting user: {}", id);

        if self.user_repository.find_by_id(id).await?.is_none() {
            return Ok(false);
        }

        let wiped = self.wallet_client.delete_user_transactions(id).await?;
        debug!(
            "Wallet removed {} transactions for user {}",
            wiped.deleted_count, id
        );

        let deleted = self.user_repository.delete(id).await?;
        if deleted {
            info!("User deleted: {}", id);
            self.audit_log
                .record(
                    AuditAction::UserDeleted,
                    id.to_string(),
                    Some(json!({ "deleted_transactions": wiped.deleted_count })),
                    ctx,
                )
                .await;
        }

        Ok(deleted)
    }
}
