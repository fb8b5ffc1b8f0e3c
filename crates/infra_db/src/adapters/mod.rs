//! Domain Adapters
//!
//! Adapter implementations for domain ports, connecting domain interfaces
//! to the PostgreSQL database layer.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresInvoiceDao;
//! use domain_invoice::InvoiceUserApi;
//!
//! let dao = PostgresInvoiceDao::new(pool, event_bus);
//! let api = InvoiceUserApi::new(Arc::new(dao));
//! ```

pub mod invoice;

pub use invoice::PostgresInvoiceDao;
