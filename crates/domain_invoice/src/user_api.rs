//! Invoice user API
//!
//! The facade external callers use. It takes typed identifiers and
//! timestamps, turns them into the keys and dates the DAO works with, and
//! returns whatever the DAO returns. Errors pass through untouched.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use core_kernel::{AccountId, InvoiceId, Money, PaymentId, PortError, SubscriptionId};

use crate::invoice::Invoice;
use crate::item::InvoiceItem;
use crate::ports::InvoiceDao;

/// Facade over an `InvoiceDao`
#[derive(Clone)]
pub struct InvoiceUserApi {
    dao: Arc<dyn InvoiceDao>,
}

impl InvoiceUserApi {
    /// Creates the facade over the given DAO
    pub fn new(dao: Arc<dyn InvoiceDao>) -> Self {
        Self { dao }
    }

    /// Ids of outstanding invoices due within `number_of_days` of `target_date`
    ///
    /// Only the calendar date of `target_date` (in UTC) is used.
    #[instrument(skip(self))]
    pub async fn get_invoices_for_payment(
        &self,
        target_date: DateTime<Utc>,
        number_of_days: u32,
    ) -> Result<Vec<InvoiceId>, PortError> {
        self.dao
            .get_invoices_for_payment(target_date.date_naive(), number_of_days)
            .await
    }

    /// Invoices of an account, with items and payments
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn get_invoices_by_account(&self, account_id: AccountId) -> Result<Vec<Invoice>, PortError> {
        self.dao.get_invoices_by_account(&account_id.key()).await
    }

    /// Items across every invoice of an account
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn get_invoice_items_by_account(&self, account_id: AccountId) -> Result<Vec<InvoiceItem>, PortError> {
        self.dao.get_invoice_items_by_account(&account_id.key()).await
    }

    /// Invoices that bill a subscription
    #[instrument(skip(self), fields(subscription_id = %subscription_id))]
    pub async fn get_invoices_by_subscription(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<Vec<Invoice>, PortError> {
        self.dao.get_invoices_by_subscription(&subscription_id.key()).await
    }

    /// One invoice, or `None` if the id is unknown
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn get_invoice(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>, PortError> {
        self.dao.get_by_id(&invoice_id.key()).await
    }

    /// Stores and announces a new invoice; repeated calls are no-ops
    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id))]
    pub async fn create_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
        self.dao.create(invoice).await
    }

    /// Records a failed payment attempt
    #[instrument(skip(self), fields(invoice_id = %invoice_id, payment_id = %payment_id))]
    pub async fn payment_attempt_failed(
        &self,
        invoice_id: InvoiceId,
        payment_id: PaymentId,
        payment_attempt_date: DateTime<Utc>,
    ) -> Result<(), PortError> {
        self.dao
            .notify_failed_payment(&invoice_id.key(), &payment_id.key(), payment_attempt_date)
            .await
    }

    /// Records a successful payment of `amount`
    #[instrument(skip(self), fields(invoice_id = %invoice_id, payment_id = %payment_id))]
    pub async fn payment_attempt_successful(
        &self,
        invoice_id: InvoiceId,
        amount: Money,
        payment_id: PaymentId,
        payment_date: DateTime<Utc>,
    ) -> Result<(), PortError> {
        self.dao
            .notify_successful_payment(
                &invoice_id.key(),
                amount.amount(),
                amount.currency().code(),
                &payment_id.key(),
                payment_date,
            )
            .await
    }
}
