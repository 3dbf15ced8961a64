//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the hiring engine using SQLx.
//!
//! # Architecture
//!
//! `repositories` holds the row types and the SQL. `adapters` implements the
//! domain ports on top of them and maps rows back into aggregates. Every
//! aggregate update is guarded by its `version` column; a lost race surfaces
//! as `PortError::Conflict`.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresHiringAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/hiring")).await?;
//! run_migrations(&pool).await?;
//! let hirings = PostgresHiringAdapter::new(pool.clone());
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use adapters::{
    PostgresClaimAdapter, PostgresHiringAdapter, PostgresIdentityAdapter, PostgresPaymentAuditAdapter,
};
