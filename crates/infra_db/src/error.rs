//! Database error types
//!
//! SQLx errors are classified by PostgreSQL error code on conversion, so a
//! unique violation surfaces as `DuplicateEntry` and, through the port
//! boundary, as `PortError::Conflict`.

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("{entity} with id '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Optimistic version check failed on update
    #[error("{entity} {id} was modified concurrently (expected version {expected})")]
    StaleVersion {
        entity: &'static str,
        id: String,
        expected: u32,
    },

    /// A stored value does not map onto a domain type
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn stale(entity: &'static str, id: impl std::fmt::Display, expected: u32) -> Self {
        DatabaseError::StaleVersion {
            entity,
            id: id.to_string(),
            expected,
        }
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        DatabaseError::CorruptRow(message.into())
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound { .. })
    }

    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::ConstraintViolation(_)
        )
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }
}

/// Maps SQLx errors onto the PostgreSQL error code they carry
///
/// See <https://www.postgresql.org/docs/current/errcodes-appendix.html>
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound {
                entity: "Record",
                id: String::from("?"),
            },
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Io(e) => DatabaseError::ConnectionFailed(e.to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DatabaseError::CorruptRow(error.to_string())
            }
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry(message),
                    Some("23503") => DatabaseError::ForeignKeyViolation(message),
                    Some("23514") => DatabaseError::ConstraintViolation(message),
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(error.to_string())
    }
}

/// Translation at the port boundary
///
/// - `NotFound` -> `PortError::NotFound`
/// - duplicates and stale versions -> `PortError::Conflict`
/// - connection problems -> `PortError::Connection`
/// - corrupt rows -> `PortError::Transformation`
impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound { entity, id } => PortError::not_found(entity, id),
            DatabaseError::DuplicateEntry(message) => PortError::conflict(message),
            DatabaseError::StaleVersion { .. } => PortError::conflict(error.to_string()),
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted => {
                PortError::connection(error.to_string())
            }
            DatabaseError::CorruptRow(message) => PortError::transformation(message),
            DatabaseError::ForeignKeyViolation(_) | DatabaseError::ConstraintViolation(_) => {
                PortError::validation(error.to_string())
            }
            other => PortError::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_version_becomes_conflict() {
        let port: PortError = DatabaseError::stale("Hiring", "HIR-1", 3).into();
        assert!(port.is_conflict());
    }

    #[test]
    fn test_not_found_keeps_entity() {
        let port: PortError = DatabaseError::not_found("Claim", "CLM-9").into();
        assert!(port.is_not_found());
        assert!(port.to_string().contains("Claim"));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(DatabaseError::from(sqlx::Error::RowNotFound).is_not_found());
        assert!(matches!(
            DatabaseError::from(sqlx::Error::PoolTimedOut),
            DatabaseError::PoolExhausted
        ));
    }
}
