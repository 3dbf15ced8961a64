//! Request and response bodies
//!
//! Requests are validated with `validator` before they reach a service;
//! responses mostly serialise the domain aggregates as they are.

pub mod hiring;
pub mod claims;
pub mod payments;
