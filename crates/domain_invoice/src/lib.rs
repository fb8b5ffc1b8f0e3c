//! Invoicing Domain
//!
//! This crate holds the invoice model and the seams through which it is
//! persisted and announced:
//!
//! - **Invoice** owns its line items and its payment history. Both are
//!   attached after the invoice row is loaded.
//! - **InvoiceDao** is the persistence port. The PostgreSQL implementation
//!   lives in `infra_db`; an in-memory one is available behind the `mock`
//!   feature.
//! - **InvoiceEventBus** is the notification port. Creating an invoice posts
//!   exactly one `InvoiceCreationNotification`.
//! - **InvoiceUserApi** is the facade callers use. It converts typed
//!   identifiers and timestamps into the keys and dates the DAO works with.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use domain_invoice::{InvoiceUserApi, BroadcastEventBus};
//! use infra_db::adapters::PostgresInvoiceDao;
//!
//! let bus = Arc::new(BroadcastEventBus::default());
//! let dao = Arc::new(PostgresInvoiceDao::new(pool, bus.clone()));
//! let api = InvoiceUserApi::new(dao);
//!
//! api.create_invoice(&invoice).await?;
//! let loaded = api.get_invoice(invoice.id).await?;
//! ```

pub mod invoice;
pub mod item;
pub mod payment;
pub mod events;
pub mod ports;
pub mod bus;
pub mod user_api;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use invoice::{due_window_end, Invoice};
pub use item::InvoiceItem;
pub use payment::{InvoicePayment, PaymentOutcome};
pub use events::{InvoiceCreationNotification, InvoiceEvent};
pub use ports::{InvoiceDao, InvoiceEventBus};
pub use bus::BroadcastEventBus;
pub use user_api::InvoiceUserApi;
