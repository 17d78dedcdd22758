//! # Paylink Server Library
//!
//! Composition root and process lifecycle for the `users` and `wallet`
//! roles.

pub mod app;
pub mod di;
pub mod startup;
