//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{AccountId, Currency, InvoiceId, Money, PaymentId, SubscriptionId};
use domain_invoice::{Invoice, InvoiceItem, InvoicePayment};
use rust_decimal::Decimal;

use crate::fixtures::{DateFixtures, IdFixtures, StringFixtures};

/// Builder for a single invoice item
///
/// The owning invoice and currency are filled in by `TestInvoiceBuilder`.
#[derive(Debug, Clone)]
pub struct TestInvoiceItemBuilder {
    subscription_id: SubscriptionId,
    start_date: NaiveDate,
    end_date: NaiveDate,
    description: String,
    amount: Decimal,
    rate: Decimal,
}

impl TestInvoiceItemBuilder {
    /// Creates an item builder charging `amount`
    pub fn new(amount: Decimal) -> Self {
        Self {
            subscription_id: IdFixtures::subscription_id(),
            start_date: DateFixtures::period_start(),
            end_date: DateFixtures::period_end(),
            description: StringFixtures::plan_description().to_string(),
            amount,
            rate: amount,
        }
    }

    /// Sets the billed subscription
    pub fn with_subscription_id(mut self, id: SubscriptionId) -> Self {
        self.subscription_id = id;
        self
    }

    /// Sets the service period
    pub fn with_period(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the unit rate
    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.rate = rate;
        self
    }

    /// Builds the item for the given invoice
    pub fn build(self, invoice_id: InvoiceId, currency: Currency) -> InvoiceItem {
        InvoiceItem::new(
            invoice_id,
            self.subscription_id,
            self.start_date,
            self.end_date,
            self.description,
            self.amount,
            self.rate,
            currency,
        )
    }
}

#[derive(Debug, Clone)]
enum PlannedPayment {
    Succeeded { amount: Decimal, date: DateTime<Utc> },
    Failed { date: DateTime<Utc> },
}

/// Builder for constructing test invoices
#[derive(Debug, Clone)]
pub struct TestInvoiceBuilder {
    id: InvoiceId,
    account_id: AccountId,
    invoice_date: DateTime<Utc>,
    target_date: NaiveDate,
    currency: Currency,
    items: Vec<TestInvoiceItemBuilder>,
    payments: Vec<PlannedPayment>,
}

impl Default for TestInvoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestInvoiceBuilder {
    /// Creates a new builder with default values and no items
    pub fn new() -> Self {
        Self {
            id: InvoiceId::new(),
            account_id: IdFixtures::account_id(),
            invoice_date: DateFixtures::invoice_date(),
            target_date: DateFixtures::target_date(),
            currency: Currency::USD,
            items: Vec::new(),
            payments: Vec::new(),
        }
    }

    /// Sets the invoice ID
    pub fn with_id(mut self, id: InvoiceId) -> Self {
        self.id = id;
        self
    }

    /// Sets the account ID
    pub fn with_account_id(mut self, id: AccountId) -> Self {
        self.account_id = id;
        self
    }

    /// Sets the issue timestamp
    pub fn with_invoice_date(mut self, date: DateTime<Utc>) -> Self {
        self.invoice_date = date;
        self
    }

    /// Sets the due date
    pub fn with_target_date(mut self, date: NaiveDate) -> Self {
        self.target_date = date;
        self
    }

    /// Sets the currency of the invoice and all its lines
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Adds a default item charging `amount`
    pub fn with_item(mut self, amount: Decimal) -> Self {
        self.items.push(TestInvoiceItemBuilder::new(amount));
        self
    }

    /// Adds an item charging `amount` for a given subscription
    pub fn with_subscription_item(mut self, subscription_id: SubscriptionId, amount: Decimal) -> Self {
        self.items
            .push(TestInvoiceItemBuilder::new(amount).with_subscription_id(subscription_id));
        self
    }

    /// Adds a fully customised item
    pub fn with_item_builder(mut self, item: TestInvoiceItemBuilder) -> Self {
        self.items.push(item);
        self
    }

    /// Adds a successful payment of `amount`
    pub fn with_successful_payment(mut self, amount: Decimal, date: DateTime<Utc>) -> Self {
        self.payments.push(PlannedPayment::Succeeded { amount, date });
        self
    }

    /// Adds a failed payment attempt
    pub fn with_failed_payment(mut self, date: DateTime<Utc>) -> Self {
        self.payments.push(PlannedPayment::Failed { date });
        self
    }

    /// Builds the invoice
    pub fn build(self) -> Invoice {
        let mut invoice = Invoice::with_id(
            self.id,
            self.account_id,
            self.invoice_date,
            self.target_date,
            self.currency,
        );
        let (id, currency) = (invoice.id, invoice.currency);

        invoice.add_invoice_items(self.items.into_iter().map(|item| item.build(id, currency)));
        invoice.add_payments(self.payments.into_iter().map(|payment| match payment {
            PlannedPayment::Succeeded { amount, date } => {
                InvoicePayment::succeeded(id, PaymentId::new(), Money::new(amount, currency), date)
            }
            PlannedPayment::Failed { date } => InvoicePayment::failed(id, PaymentId::new(), date),
        }));
        invoice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invoice_builder_defaults() {
        let invoice = TestInvoiceBuilder::new().build();

        assert_eq!(invoice.account_id, IdFixtures::account_id());
        assert_eq!(invoice.target_date, DateFixtures::target_date());
        assert_eq!(invoice.currency, Currency::USD);
        assert!(invoice.items.is_empty());
        assert!(invoice.payments.is_empty());
    }

    #[test]
    fn test_invoice_builder_links_children() {
        let invoice = TestInvoiceBuilder::new()
            .with_currency(Currency::EUR)
            .with_item(dec!(10))
            .with_item(dec!(15))
            .with_successful_payment(dec!(5), DateFixtures::payment_date())
            .with_failed_payment(DateFixtures::retry_date())
            .build();

        assert!(invoice.validate().is_ok());
        assert!(invoice.items.iter().all(|i| i.invoice_id == invoice.id && i.currency == Currency::EUR));
        assert_eq!(invoice.balance().amount(), dec!(20));
    }
}
