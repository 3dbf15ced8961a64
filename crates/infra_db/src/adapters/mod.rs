//! Domain Adapters
//!
//! PostgreSQL implementations of the domain ports. Each adapter:
//! - implements its domain's port trait
//! - translates between domain aggregates and repository rows
//! - runs multi-table writes in one transaction
//! - turns `DatabaseError` into `PortError` at the boundary
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresHiringAdapter;
//! use domain_hiring::HiringRepository;
//!
//! let hirings: Arc<dyn HiringRepository> = Arc::new(PostgresHiringAdapter::new(pool));
//! let hiring = hirings.get(hiring_id).await?;
//! ```

pub mod hiring;
pub mod claims;
pub mod payments;
pub mod identity;

pub use hiring::PostgresHiringAdapter;
pub use claims::PostgresClaimAdapter;
pub use payments::PostgresPaymentAuditAdapter;
pub use identity::PostgresIdentityAdapter;

use chrono::Utc;
use sqlx::PgPool;

use core_kernel::{AdapterHealth, HealthCheckResult};

/// Runs `SELECT 1` and reports latency
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, message) = match result {
        Ok(_) => (AdapterHealth::Healthy, None),
        Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {e}"))),
    };
    HealthCheckResult {
        adapter_id: adapter_id.to_string(),
        status,
        latency_ms,
        message,
        checked_at: Utc::now(),
    }
}
