//! Process-local repository implementations.
//!
//! Used by tests and by single-instance deployments (`database.backend = "memory"`).

mod audit_log;
mod idempotency;
mod transactions;
mod users;

pub use audit_log::InMemoryAuditLogRepository;
pub use idempotency::InMemoryIdempotencyRepository;
pub use transactions::InMemoryTransactionRepository;
pub use users::InMemoryUserRepository;
