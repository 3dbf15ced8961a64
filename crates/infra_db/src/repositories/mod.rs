//! Row-level data access
//!
//! Each repository owns the SQL for one aggregate and speaks in row types
//! (`sqlx::FromRow`). Mapping rows to domain aggregates is the adapters'
//! job. Queries are checked at runtime so the crate builds without a live
//! database.
//!
//! Updates of versioned aggregates run `... WHERE version = $n` and report
//! the number of affected rows; zero means someone else saved first.

pub mod hirings;
pub mod claims;
pub mod payments;
pub mod accounts;

pub use hirings::HiringsRepository;
pub use claims::ClaimsRepository;
pub use payments::PaymentEventsRepository;
pub use accounts::AccountsRepository;

use std::fmt::Display;
use std::str::FromStr;

use crate::error::DatabaseError;

/// Parses a text column into a domain enum
pub(crate) fn parse_column<T>(column: &str, value: &str) -> Result<T, DatabaseError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| DatabaseError::corrupt(format!("column {column}: {e}")))
}

/// Counts of i32 columns back into the domain's unsigned fields
pub(crate) fn unsigned(column: &str, value: i32) -> Result<u32, DatabaseError> {
    u32::try_from(value).map_err(|_| DatabaseError::corrupt(format!("column {column} is negative: {value}")))
}
