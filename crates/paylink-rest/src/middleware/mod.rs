//! HTTP middleware.

mod auth;
mod logging;
mod rate_limit;

pub use auth::*;
pub use logging::*;
pub use rate_limit::*;
