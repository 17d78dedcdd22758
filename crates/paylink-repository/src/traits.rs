//! Repository trait definitions.

use crate::entities::{
    AuditLogEntry, IdempotencyRecord, NewAuditLogEntry, NewIdempotencyRecord, NewTransaction,
    NewUser, Transaction, TransactionFilter, User, UserChanges,
};
use async_trait::async_trait;
use paylink_core::{IdempotencyRecordId, PaylinkResult, TransactionId, UserId};

/// Store of idempotency claims.
///
/// `create` must be atomic per `(scope, key)`: of two concurrent creates for
/// the same pair exactly one succeeds, the other fails with
/// `PaylinkError::IdempotencyInProgress`.
#[async_trait]
pub trait IdempotencyRepository: Send + Sync {
    /// Finds the record for `(scope, key)`.
    async fn find_by_key(&self, scope: &str, key: &str) -> PaylinkResult<Option<IdempotencyRecord>>;

    /// Claims `(scope, key)` with an in-flight record.
    async fn create(&self, record: NewIdempotencyRecord) -> PaylinkResult<IdempotencyRecord>;

    /// Stores the outcome of the guarded operation.
    async fn update_response(
        &self,
        id: IdempotencyRecordId,
        status_code: u16,
        response_body: Option<serde_json::Value>,
    ) -> PaylinkResult<()>;

    /// Removes a claim so the key can be retried.
    async fn delete(&self, id: IdempotencyRecordId) -> PaylinkResult<()>;
}

/// User repository trait.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Saves a new user. A duplicate email is a `Conflict`.
    async fn create(&self, user: NewUser) -> PaylinkResult<User>;

    /// Lists users, newest first.
    async fn find_all(&self) -> PaylinkResult<Vec<User>>;

    /// Finds a user by ID.
    async fn find_by_id(&self, id: UserId) -> PaylinkResult<Option<User>>;

    /// Finds a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> PaylinkResult<Option<User>>;

    /// Applies `changes`; returns `None` if the user does not exist.
    async fn update(&self, id: UserId, changes: UserChanges) -> PaylinkResult<Option<User>>;

    /// Deletes a user; returns whether a row was removed.
    async fn delete(&self, id: UserId) -> PaylinkResult<bool>;
}

/// Ledger repository trait.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn create(&self, transaction: NewTransaction) -> PaylinkResult<Transaction>;

    /// Lists matching transactions, newest first.
    async fn find_all(&self, filter: TransactionFilter) -> PaylinkResult<Vec<Transaction>>;

    async fn find_by_id(&self, id: TransactionId) -> PaylinkResult<Option<Transaction>>;

    /// Credits minus debits for `user_id`.
    async fn balance(&self, user_id: UserId) -> PaylinkResult<i64>;

    /// Deletes every transaction of `user_id`; returns how many were removed.
    async fn delete_by_user_id(&self, user_id: UserId) -> PaylinkResult<u64>;
}

/// Append-only audit log.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn create(&self, entry: NewAuditLogEntry) -> PaylinkResult<AuditLogEntry>;

    /// Entries recorded for `user_id`, oldest first.
    async fn find_by_user(&self, user_id: &str) -> PaylinkResult<Vec<AuditLogEntry>>;
}
