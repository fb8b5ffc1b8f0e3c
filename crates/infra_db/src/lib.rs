//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for invoices using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern. Repositories own the SQL for
//! one table each; the `PostgresInvoiceDao` adapter composes them inside a
//! transaction and implements the `InvoiceDao` port from `domain_invoice`.
//!
//! Invoices are stored in three tables: `invoices`, `invoice_items` and the
//! append-only `invoice_payments`. Identifiers are stored as hyphenated UUID
//! strings.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresInvoiceDao};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/invoicing")).await?;
//! run_migrations(&pool).await?;
//! let dao = PostgresInvoiceDao::new(pool, event_bus);
//! ```

pub mod pool;
pub mod error;
pub mod transaction;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, create_pool_from_url, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use transaction::{IsolationLevel, TransactionManager, TransactionOptions};
pub use adapters::PostgresInvoiceDao;
