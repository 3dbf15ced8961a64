//! Test Utilities Crate
//!
//! Shared test infrastructure for the hiring engine test suite.
//!
//! # Modules
//!
//! - `fixtures`: Fixed instants, amounts and claim filings
//! - `builders`: Builders for quote terms, hirings at a given stage and
//!   webhook events
//! - `harness`: Every service wired over the in-memory adapters and a
//!   manual clock
//! - `database`: PostgreSQL test container with the schema applied
//! - `assertions`: Assertion helpers for domain types and error kinds
//! - `generators`: proptest strategies and `fake` data

pub mod fixtures;
pub mod builders;
pub mod harness;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use harness::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
