//! Invoice aggregate
//!
//! An invoice is loaded in three steps: the invoice row itself, then its
//! line items, then its payment history. The child collections start empty
//! and are filled with `add_invoice_items` / `add_payments`.

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, CoreError, Currency, InvoiceId, Money};

use crate::item::InvoiceItem;
use crate::payment::InvoicePayment;

/// A billable statement for an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Account being billed
    pub account_id: AccountId,
    /// When the invoice was generated
    pub invoice_date: DateTime<Utc>,
    /// Date payment is due
    pub target_date: NaiveDate,
    /// Currency of every item and payment on the invoice
    pub currency: Currency,
    /// Line items
    pub items: Vec<InvoiceItem>,
    /// Payment attempts, oldest first
    pub payments: Vec<InvoicePayment>,
}

impl Invoice {
    /// Creates a new, empty invoice
    ///
    /// # Arguments
    ///
    /// * `account_id` - Account being billed
    /// * `invoice_date` - Generation timestamp
    /// * `target_date` - Payment due date
    /// * `currency` - Invoice currency
    pub fn new(
        account_id: AccountId,
        invoice_date: DateTime<Utc>,
        target_date: NaiveDate,
        currency: Currency,
    ) -> Self {
        Self::with_id(InvoiceId::new_v7(), account_id, invoice_date, target_date, currency)
    }

    /// Creates an empty invoice with a known identifier
    ///
    /// Used when rebuilding an invoice from storage.
    pub fn with_id(
        id: InvoiceId,
        account_id: AccountId,
        invoice_date: DateTime<Utc>,
        target_date: NaiveDate,
        currency: Currency,
    ) -> Self {
        Self {
            id,
            account_id,
            invoice_date,
            target_date,
            currency,
            items: Vec::new(),
            payments: Vec::new(),
        }
    }

    /// Appends line items
    pub fn add_invoice_items(&mut self, items: impl IntoIterator<Item = InvoiceItem>) {
        self.items.extend(items);
    }

    /// Appends payment attempts
    pub fn add_payments(&mut self, payments: impl IntoIterator<Item = InvoicePayment>) {
        self.payments.extend(payments);
    }

    /// Sum of all item amounts
    ///
    /// Sums saturate at the `Decimal` bounds. `validate` rejects amounts
    /// the store cannot hold, so stored invoices stay far below them.
    pub fn total_amount(&self) -> Money {
        let total = self
            .items
            .iter()
            .fold(Decimal::ZERO, |acc, i| acc.saturating_add(i.amount));
        Money::new(total, self.currency)
    }

    /// Sum of all successfully collected payments
    pub fn amount_paid(&self) -> Money {
        let paid = self
            .payments
            .iter()
            .filter_map(InvoicePayment::collected)
            .fold(Decimal::ZERO, |acc, m| acc.saturating_add(m.amount()));
        Money::new(paid, self.currency)
    }

    /// Amount still owed: total minus amount paid
    pub fn balance(&self) -> Money {
        Money::new(
            self.total_amount().amount().saturating_sub(self.amount_paid().amount()),
            self.currency,
        )
    }

    /// Latest payment attempt, successful or not
    pub fn last_payment_attempt(&self) -> Option<DateTime<Utc>> {
        self.payments.iter().map(|p| p.payment_attempt_date).max()
    }

    /// Returns true while there is a positive balance
    pub fn is_outstanding(&self) -> bool {
        self.balance().is_positive()
    }

    /// Returns true if the target date falls within `[from, from + days]`
    pub fn is_due_within(&self, from: NaiveDate, days: u32) -> bool {
        self.target_date >= from && self.target_date <= due_window_end(from, days)
    }

    /// Checks that every child belongs to this invoice and shares its currency,
    /// and that every line covers a forward period
    ///
    /// # Errors
    ///
    /// Returns the `CoreError` for the first offending child.
    pub fn validate(&self) -> Result<(), CoreError> {
        for item in &self.items {
            let child = || format!("item {}", item.id);
            if item.invoice_id != self.id {
                return Err(CoreError::ForeignChild {
                    child: child(),
                    owner: item.invoice_id.to_string(),
                    expected: self.id.to_string(),
                });
            }
            if item.currency != self.currency {
                return Err(CoreError::CurrencyMismatch {
                    child: child(),
                    found: item.currency,
                    expected: self.currency,
                });
            }
            if item.end_date < item.start_date {
                return Err(CoreError::InvertedPeriod {
                    child: child(),
                    start: item.start_date,
                    end: item.end_date,
                });
            }
            item.check_amounts()?;
        }

        for payment in &self.payments {
            let child = || format!("payment {}", payment.payment_id);
            if payment.invoice_id != self.id {
                return Err(CoreError::ForeignChild {
                    child: child(),
                    owner: payment.invoice_id.to_string(),
                    expected: self.id.to_string(),
                });
            }
            payment.check_amount(self.currency)?;
        }

        Ok(())
    }
}

/// Last day of a payment window of `days` days starting at `from`
///
/// A window reaching past the last representable date is open-ended.
pub fn due_window_end(from: NaiveDate, days: u32) -> NaiveDate {
    from.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}
