//! MySQL repository implementations.

mod audit_log;
mod idempotency;
mod transactions;
mod users;

pub use audit_log::MySqlAuditLogRepository;
pub use idempotency::MySqlIdempotencyRepository;
pub use transactions::MySqlTransactionRepository;
pub use users::MySqlUserRepository;

use paylink_core::{PaylinkError, PaylinkResult};
use uuid::Uuid;

/// Parses a CHAR(36) id column into a typed id.
fn parse_id<T: From<Uuid>>(raw: &str) -> PaylinkResult<T> {
    Uuid::parse_str(raw)
        .map(T::from)
        .map_err(|e| PaylinkError::Internal(format!("Invalid UUID in database: {}", e)))
}
