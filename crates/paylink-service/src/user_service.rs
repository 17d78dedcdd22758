//! User service trait definition.

use crate::dto::{CreateUserRequest, RequestContext, UpdateUserRequest, UserResponse};
use async_trait::async_trait;
use paylink_core::{PaylinkResult, UserId};

/// User use cases.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Creates a new user; a taken email is a conflict.
    async fn create_user(
        &self,
        request: CreateUserRequest,
        ctx: &RequestContext,
    ) -> PaylinkResult<UserResponse>;

    /// Gets a user by ID.
    async fn get_user(&self, id: UserId) -> PaylinkResult<UserResponse>;

    /// Lists all users, newest first.
    async fn list_users(&self) -> PaylinkResult<Vec<UserResponse>>;

    /// Updates a user's profile.
    async fn update_user(
        &self,
        id: UserId,
        request: UpdateUserRequest,
        ctx: &RequestContext,
    ) -> PaylinkResult<UserResponse>;

    /// Deletes a user and, first, the user's wallet transactions.
    ///
    /// Returns `false` if the user does not exist. A wallet failure leaves
    /// the user in place.
    async fn delete_user(&self, id: UserId, ctx: &RequestContext) -> PaylinkResult<bool>;
}
