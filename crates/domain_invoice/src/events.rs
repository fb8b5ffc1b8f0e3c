//! Domain events for invoices
//!
//! The invoicing layer announces one thing: that a new invoice exists.
//! Consumers (payment scheduling, dunning, notifications) are external.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, Currency, InvoiceId};

use crate::invoice::Invoice;

/// Published once per successfully created invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCreationNotification {
    pub invoice_id: InvoiceId,
    pub account_id: AccountId,
    /// Balance at creation time
    pub balance: Decimal,
    pub currency: Currency,
    pub invoice_date: DateTime<Utc>,
}

impl InvoiceCreationNotification {
    /// Captures the notification fields from a freshly created invoice
    pub fn from_invoice(invoice: &Invoice) -> Self {
        Self {
            invoice_id: invoice.id,
            account_id: invoice.account_id,
            balance: invoice.balance().amount(),
            currency: invoice.currency,
            invoice_date: invoice.invoice_date,
        }
    }
}

/// Events posted to the invoice event bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InvoiceEvent {
    /// A new invoice was stored
    InvoiceCreated(InvoiceCreationNotification),
}

impl InvoiceEvent {
    /// Returns the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::InvoiceCreated(_) => "InvoiceCreated",
        }
    }

    /// Returns the invoice the event is about
    pub fn invoice_id(&self) -> InvoiceId {
        match self {
            InvoiceEvent::InvoiceCreated(n) => n.invoice_id,
        }
    }
}

impl From<InvoiceCreationNotification> for InvoiceEvent {
    fn from(notification: InvoiceCreationNotification) -> Self {
        InvoiceEvent::InvoiceCreated(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_kernel::{PaymentId, SubscriptionId, Money};
    use rust_decimal_macros::dec;
    use crate::{InvoiceItem, InvoicePayment};

    #[test]
    fn test_notification_carries_balance() {
        let mut invoice = Invoice::new(
            AccountId::new(),
            Utc::now(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            Currency::USD,
        );
        invoice.add_invoice_items(vec![InvoiceItem::new(
            invoice.id,
            SubscriptionId::new(),
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
            "Plan",
            dec!(50.00),
            dec!(50.00),
            Currency::USD,
        )]);
        invoice.add_payments(vec![InvoicePayment::succeeded(
            invoice.id,
            PaymentId::new(),
            Money::new(dec!(20.00), Currency::USD),
            Utc::now(),
        )]);

        let notification = InvoiceCreationNotification::from_invoice(&invoice);
        assert_eq!(notification.invoice_id, invoice.id);
        assert_eq!(notification.account_id, invoice.account_id);
        assert_eq!(notification.balance, dec!(30.00));
        assert_eq!(notification.currency, Currency::USD);
        assert_eq!(notification.invoice_date, invoice.invoice_date);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = InvoiceEvent::from(InvoiceCreationNotification {
            invoice_id: InvoiceId::new(),
            account_id: AccountId::new(),
            balance: dec!(10),
            currency: Currency::EUR,
            invoice_date: Utc::now(),
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "invoice_created");
        assert_eq!(json["currency"], "EUR");
        assert_eq!(event.event_type(), "InvoiceCreated");
    }
}
