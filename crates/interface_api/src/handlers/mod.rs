//! Request handlers
//!
//! Handlers translate between HTTP and the domain services held in
//! `AppState`. They do no business checks of their own beyond body
//! validation; authorization is decided by the services from the caller's
//! `Actor`.

pub mod health;
pub mod hiring;
pub mod payments;
pub mod claims;
pub mod compliance;
