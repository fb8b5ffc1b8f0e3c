//! Invoice Domain Ports
//!
//! `InvoiceDao` is the persistence port and `InvoiceEventBus` the
//! notification port. Both are injected as trait objects:
//!
//! ```rust,ignore
//! let bus: Arc<dyn InvoiceEventBus> = Arc::new(BroadcastEventBus::default());
//! let dao: Arc<dyn InvoiceDao> = Arc::new(PostgresInvoiceDao::new(pool, bus));
//! let api = InvoiceUserApi::new(dao);
//! ```
//!
//! The DAO speaks in store keys: identifiers arrive as hyphenated UUID
//! strings and the payment window as a calendar date. Converting from typed
//! identifiers is the facade's job.
//!
//! Every DAO operation runs in a single transaction. A failure anywhere in
//! the operation leaves the store untouched and is returned to the caller.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use core_kernel::{DomainPort, InvoiceId, PortError};

use crate::events::InvoiceEvent;
use crate::invoice::Invoice;
use crate::item::InvoiceItem;

/// Persistence port for invoices, their items, and their payments
#[async_trait]
pub trait InvoiceDao: DomainPort {
    /// Returns every invoice with items and payments attached
    async fn get_invoices(&self) -> Result<Vec<Invoice>, PortError>;

    /// Returns the invoices of an account with items and payments attached
    async fn get_invoices_by_account(&self, account_id: &str) -> Result<Vec<Invoice>, PortError>;

    /// Returns every item on every invoice of an account
    async fn get_invoice_items_by_account(&self, account_id: &str) -> Result<Vec<InvoiceItem>, PortError>;

    /// Returns the invoices carrying at least one item for a subscription
    async fn get_invoices_by_subscription(&self, subscription_id: &str) -> Result<Vec<Invoice>, PortError>;

    /// Returns one invoice with items and payments, or `None` if unknown
    async fn get_by_id(&self, invoice_id: &str) -> Result<Option<Invoice>, PortError>;

    /// Stores an invoice with its items and payments and announces it
    ///
    /// Creating an invoice whose id already exists is a silent no-op: nothing
    /// is written and no event is posted.
    async fn create(&self, invoice: &Invoice) -> Result<(), PortError>;

    /// Returns ids of invoices with an outstanding balance whose target date
    /// lies within `[target_date, target_date + number_of_days]`
    async fn get_invoices_for_payment(
        &self,
        target_date: NaiveDate,
        number_of_days: u32,
    ) -> Result<Vec<InvoiceId>, PortError>;

    /// Appends a successful payment to the invoice's history
    async fn notify_successful_payment(
        &self,
        invoice_id: &str,
        amount: Decimal,
        currency: &str,
        payment_id: &str,
        payment_date: DateTime<Utc>,
    ) -> Result<(), PortError>;

    /// Appends a failed payment attempt to the invoice's history
    async fn notify_failed_payment(
        &self,
        invoice_id: &str,
        payment_id: &str,
        payment_attempt_date: DateTime<Utc>,
    ) -> Result<(), PortError>;
}

/// Notification port for invoice events
#[async_trait]
pub trait InvoiceEventBus: DomainPort {
    /// Posts an event to every subscriber
    async fn post(&self, event: InvoiceEvent) -> Result<(), PortError>;
}
