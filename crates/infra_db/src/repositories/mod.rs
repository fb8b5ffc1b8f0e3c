//! Repository implementations for invoice tables
//!
//! Each repository maps one table to a row type and back to the domain
//! model. Repositories are stateless: every function takes the connection
//! (usually a transaction) it should run on, so the adapter decides the
//! transaction boundary.

pub mod invoice;
pub mod invoice_item;
pub mod invoice_payment;

pub use invoice::{InvoiceRepository, InvoiceRow};
pub use invoice_item::{InvoiceItemRepository, InvoiceItemRow};
pub use invoice_payment::{InvoicePaymentRepository, InvoicePaymentRow};
