//! Data transfer objects.

mod auth_dto;
mod request_context;
mod transaction_dto;
mod user_dto;

pub use auth_dto::*;
pub use request_context::*;
pub use transaction_dto::*;
pub use user_dto::*;
