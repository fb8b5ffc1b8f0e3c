//! Transaction management
//!
//! Every DAO operation runs inside one transaction obtained here. Reads use
//! a read-only transaction so that the invoice row, its items and its
//! payments are loaded from one consistent snapshot. Dropping a transaction
//! without committing rolls it back.

use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::error::DatabaseError;

/// Transaction isolation level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IsolationLevel {
    /// PostgreSQL default
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// Returns the SQL keyword form
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Options applied with `SET TRANSACTION` right after `BEGIN`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    pub isolation_level: IsolationLevel,
    pub read_only: bool,
}

impl TransactionOptions {
    /// Read-write, read committed
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the isolation level
    pub fn with_isolation_level(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = level;
        self
    }

    /// Marks the transaction read-only
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Renders the `SET TRANSACTION` statement
    pub fn to_sql(&self) -> String {
        let access = if self.read_only { "READ ONLY" } else { "READ WRITE" };
        format!(
            "SET TRANSACTION ISOLATION LEVEL {}, {}",
            self.isolation_level.as_sql(),
            access
        )
    }
}

/// Opens transactions on a pool with fixed read and write options
#[derive(Debug, Clone)]
pub struct TransactionManager {
    pool: PgPool,
    read_options: TransactionOptions,
    write_options: TransactionOptions,
}

impl TransactionManager {
    /// Creates a manager using repeatable-read, read-only transactions for
    /// reads and read-committed transactions for writes
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            read_options: TransactionOptions::new()
                .with_isolation_level(IsolationLevel::RepeatableRead)
                .read_only(),
            write_options: TransactionOptions::new(),
        }
    }

    /// Returns the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begins a transaction with explicit options
    ///
    /// Plain read-committed read-write transactions skip the extra
    /// `SET TRANSACTION` round trip.
    pub async fn begin_with_options(
        &self,
        options: &TransactionOptions,
    ) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(format!("begin: {}", e)))?;

        if *options != TransactionOptions::default() {
            sqlx::query(&options.to_sql()).execute(&mut *tx).await?;
        }
        debug!(read_only = options.read_only, isolation = options.isolation_level.as_sql(), "Transaction started");
        Ok(tx)
    }

    /// Begins a read transaction
    pub async fn begin_read(&self) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        self.begin_with_options(&self.read_options).await
    }

    /// Begins a write transaction
    pub async fn begin_write(&self) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        self.begin_with_options(&self.write_options).await
    }

    /// Commits a transaction
    pub async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), DatabaseError> {
        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(format!("commit: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_sql() {
        assert_eq!(
            TransactionOptions::new().to_sql(),
            "SET TRANSACTION ISOLATION LEVEL READ COMMITTED, READ WRITE"
        );
    }

    #[test]
    fn test_read_only_repeatable_read_sql() {
        let options = TransactionOptions::new()
            .with_isolation_level(IsolationLevel::RepeatableRead)
            .read_only();

        assert_eq!(
            options.to_sql(),
            "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY"
        );
    }
}
