//! Database error types
//!
//! Failures from SQLx are classified by PostgreSQL SQLSTATE code, then
//! handed to the domain as `PortError` with the original error kept as
//! the source.

use core_kernel::PortError;
use thiserror::Error;

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
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Transaction error
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored row could not be turned back into a domain value
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Generic SQL error
    #[error("SQL error: {0}")]
    SqlError(#[source] sqlx::Error),
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    ///
    /// # Example
    ///
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("Invoice", "INV-123");
    /// assert!(error.to_string().contains("Invoice"));
    /// ```
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    /// Creates an error for a row column that does not parse
    pub fn invalid_column(column: &str, value: impl std::fmt::Display) -> Self {
        DatabaseError::InvalidData(format!("column {} holds unparseable value '{}'", column, value))
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
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

/// Maps SQLx errors onto the variants above by PostgreSQL error code
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        let classified = match &error {
            sqlx::Error::RowNotFound => Some(DatabaseError::NotFound("Record not found".to_string())),
            sqlx::Error::PoolTimedOut => Some(DatabaseError::PoolExhausted),
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                Some(DatabaseError::ConnectionFailed(error.to_string()))
            }
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                let message = db_err.message().to_string();
                let code = db_err.code().map(|c| c.into_owned());
                match code.as_deref() {
                    Some("23505") => Some(DatabaseError::DuplicateEntry(message)),
                    Some("23503") => Some(DatabaseError::ForeignKeyViolation(message)),
                    Some("23514") => Some(DatabaseError::ConstraintViolation(message)),
                    Some("40001") | Some("40P01") => Some(DatabaseError::TransactionFailed(message)),
                    _ => None,
                }
            }
            _ => None,
        };

        classified.unwrap_or(DatabaseError::SqlError(error))
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(error.to_string())
    }
}

impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound(message) => PortError::not_found("Record", message),
            DatabaseError::DuplicateEntry(message) => PortError::Conflict { message },
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted => PortError::Connection {
                message: error.to_string(),
                source: Some(Box::new(error)),
            },
            other => PortError::storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error = DatabaseError::from(sqlx::Error::RowNotFound);
        assert!(error.is_not_found());
    }

    #[test]
    fn test_pool_timeout_is_connection_error() {
        let error = DatabaseError::from(sqlx::Error::PoolTimedOut);
        assert!(error.is_connection_error());
        assert!(PortError::from(error).is_connection_error());
    }

    #[test]
    fn test_storage_failure_keeps_source() {
        let port_error = PortError::from(DatabaseError::invalid_column("currency", "XXX"));

        assert!(matches!(port_error, PortError::Storage { .. }));
        let source = std::error::Error::source(&port_error).expect("source kept");
        assert!(source.to_string().contains("currency"));
    }

    #[test]
    fn test_duplicate_is_conflict() {
        let port_error = PortError::from(DatabaseError::DuplicateEntry("invoices_pkey".into()));
        assert!(matches!(port_error, PortError::Conflict { .. }));
    }
}
