//! Service implementations.

mod auth_service_impl;
mod user_service_impl;
mod wallet_service_impl;

pub use auth_service_impl::AuthServiceImpl;
pub use user_service_impl::UserServiceImpl;
pub use wallet_service_impl::WalletServiceImpl;
