//! Persisted records for both services.

use chrono::{DateTime, Utc};
use paylink_core::{AuditLogId, IdempotencyRecordId, PaylinkError, TransactionId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Idempotency
// =============================================================================

/// A claim on `(scope, key)` and, once the guarded operation succeeds, its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub id: IdempotencyRecordId,
    pub key: String,
    pub scope: String,
    pub request_hash: String,
    /// `None` while the guarded operation is still in flight.
    pub status_code: Option<u16>,
    pub response_body: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    /// Returns true once an outcome has been stored.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.status_code.is_some()
    }
}

/// Input for claiming a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdempotencyRecord {
    pub key: String,
    pub scope: String,
    pub request_hash: String,
}

impl NewIdempotencyRecord {
    /// Builds the in-flight record for this claim.
    #[must_use]
    pub fn into_record(self) -> IdempotencyRecord {
        IdempotencyRecord {
            id: IdempotencyRecordId::new(),
            key: self.key,
            scope: self.scope,
            request_hash: self.request_hash,
            status_code: None,
            response_body: None,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Users
// =============================================================================

/// A user owned by the users service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2id PHC string; never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    #[must_use]
    pub fn into_user(self) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password_hash: self.password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
    }

    /// Applies the changes in place and bumps `updated_at`.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(first_name) = &self.first_name {
            user.first_name.clone_from(first_name);
        }
        if let Some(last_name) = &self.last_name {
            user.last_name.clone_from(last_name);
        }
        if let Some(email) = &self.email {
            user.email.clone_from(email);
        }
        if let Some(password_hash) = &self.password_hash {
            user.password_hash.clone_from(password_hash);
        }
        user.updated_at = Utc::now();
    }
}

// =============================================================================
// Transactions
// =============================================================================

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "CREDIT",
            Self::Debit => "DEBIT",
        }
    }

    /// Signed contribution of `amount` to a balance.
    #[must_use]
    pub const fn signed(&self, amount: i64) -> i64 {
        match self {
            Self::Credit => amount,
            Self::Debit => -amount,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = PaylinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREDIT" => Ok(Self::Credit),
            "DEBIT" => Ok(Self::Debit),
            other => Err(PaylinkError::validation(format!(
                "Unknown transaction type: {}",
                other
            ))),
        }
    }
}

/// A ledger entry; amounts are integer minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub amount: i64,
    pub kind: TransactionKind,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub amount: i64,
    pub kind: TransactionKind,
    pub description: Option<String>,
}

impl NewTransaction {
    #[must_use]
    pub fn into_transaction(self) -> Transaction {
        let now = Utc::now();
        Transaction {
            id: TransactionId::new(),
            user_id: self.user_id,
            amount: self.amount,
            kind: self.kind,
            description: self.description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Listing filter; empty matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub user_id: Option<UserId>,
    pub kind: Option<TransactionKind>,
}

impl TransactionFilter {
    #[must_use]
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            kind: None,
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: Option<TransactionKind>) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.user_id.map_or(true, |id| id == transaction.user_id)
            && self.kind.map_or(true, |kind| kind == transaction.kind)
    }
}

// =============================================================================
// Audit log
// =============================================================================

/// Audited mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    UserAuthenticated,
    UserCreated,
    UserUpdated,
    UserDeleted,
    TransactionCreated,
    TransactionsDeleted,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UserAuthenticated => "USER_AUTHENTICATED",
            Self::UserCreated => "USER_CREATED",
            Self::UserUpdated => "USER_UPDATED",
            Self::UserDeleted => "USER_DELETED",
            Self::TransactionCreated => "TRANSACTION_CREATED",
            Self::TransactionsDeleted => "TRANSACTIONS_DELETED",
        }
    }

    /// Resource family the action touches.
    #[must_use]
    pub const fn resource(&self) -> &'static str {
        match self {
            Self::UserAuthenticated => "auth",
            Self::UserCreated | Self::UserUpdated | Self::UserDeleted => "users",
            Self::TransactionCreated | Self::TransactionsDeleted => "transactions",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: AuditLogId,
    pub user_id: String,
    pub action: String,
    pub resource: String,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for an audit entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditLogEntry {
    pub user_id: String,
    pub action: AuditAction,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewAuditLogEntry {
    #[must_use]
    pub fn new(action: AuditAction, user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            action,
            metadata: None,
            ip_address: None,
            user_agent: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attaches the caller's address and user agent.
    #[must_use]
    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    #[must_use]
    pub fn into_entry(self) -> AuditLogEntry {
        AuditLogEntry {
            id: AuditLogId::new(),
            user_id: self.user_id,
            action: self.action.as_str().to_string(),
            resource: self.action.resource().to_string(),
            metadata: self.metadata,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at: Utc::now(),
        }
    }
}
