//! Result type alias.

use crate::PaylinkError;

/// A specialized `Result` type for paylink operations.
pub type PaylinkResult<T> = Result<T, PaylinkError>;
