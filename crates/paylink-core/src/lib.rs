//! # Paylink Core
//!
//! Error taxonomy, typed identifiers, and validation helpers shared by the
//! users and wallet services.

pub mod error;
pub mod id;
pub mod result;
pub mod validation;

pub use error::*;
pub use id::*;
pub use result::*;
pub use validation::*;
