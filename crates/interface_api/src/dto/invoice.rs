//! Invoice DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{AccountId, Currency, InvoiceId, InvoiceItemId, Money, PaymentId, SubscriptionId};
use domain_invoice::{Invoice, InvoiceItem, InvoicePayment, PaymentOutcome};

use crate::error::ApiError;

fn parse_currency(code: &str) -> Result<Currency, ApiError> {
    code.parse()
        .map_err(|e: core_kernel::MoneyError| ApiError::Validation(e.to_string(), Some(vec!["currency".to_string()])))
}

fn non_negative(value: Decimal, field: &str) -> Result<(), ApiError> {
    if value < Decimal::ZERO {
        return Err(ApiError::Validation(
            format!("{} must not be negative", field),
            Some(vec![field.to_string()]),
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceItemRequest {
    pub subscription_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(length(min = 1, max = 255))]
    pub description: String,
    pub amount: Decimal,
    /// Defaults to `amount`
    pub rate: Option<Decimal>,
}

/// Body of `POST /invoices`
///
/// `id` may be supplied by the caller so that retries stay idempotent.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    pub id: Option<Uuid>,
    pub account_id: Uuid,
    pub invoice_date: Option<DateTime<Utc>>,
    pub target_date: NaiveDate,
    #[validate(length(equal = 3))]
    pub currency: String,
    #[validate(nested)]
    #[serde(default)]
    pub items: Vec<CreateInvoiceItemRequest>,
}

impl CreateInvoiceRequest {
    /// Builds the invoice after field validation has passed
    pub fn into_invoice(self) -> Result<Invoice, ApiError> {
        let currency = parse_currency(&self.currency)?;
        let id = self.id.map(InvoiceId::from_uuid).unwrap_or_else(InvoiceId::new_v7);

        let mut invoice = Invoice::with_id(
            id,
            AccountId::from_uuid(self.account_id),
            self.invoice_date.unwrap_or_else(Utc::now),
            self.target_date,
            currency,
        );

        let mut items = Vec::with_capacity(self.items.len());
        for item in self.items {
            non_negative(item.amount, "amount")?;
            if item.end_date < item.start_date {
                return Err(ApiError::Validation(
                    "item period ends before it starts".to_string(),
                    Some(vec!["end_date".to_string()]),
                ));
            }
            items.push(InvoiceItem::new(
                id,
                SubscriptionId::from_uuid(item.subscription_id),
                item.start_date,
                item.end_date,
                item.description,
                item.amount,
                item.rate.unwrap_or(item.amount),
                currency,
            ));
        }
        invoice.add_invoice_items(items);
        Ok(invoice)
    }
}

/// Body of `POST /invoices/:id/payments/success`
#[derive(Debug, Deserialize, Validate)]
pub struct PaymentSuccessRequest {
    pub payment_id: Uuid,
    pub amount: Decimal,
    #[validate(length(equal = 3))]
    pub currency: String,
    pub payment_date: Option<DateTime<Utc>>,
}

impl PaymentSuccessRequest {
    /// Returns the collected amount
    pub fn money(&self) -> Result<Money, ApiError> {
        non_negative(self.amount, "amount")?;
        Ok(Money::new(self.amount, parse_currency(&self.currency)?))
    }
}

/// Body of `POST /invoices/:id/payments/failure`
#[derive(Debug, Deserialize, Validate)]
pub struct PaymentFailureRequest {
    pub payment_id: Uuid,
    pub payment_attempt_date: Option<DateTime<Utc>>,
}

/// Query of `GET /invoices/due`
#[derive(Debug, Deserialize, Validate)]
pub struct DueInvoicesQuery {
    /// Start of the window; defaults to now
    pub target_date: Option<DateTime<Utc>>,
    #[validate(range(max = 3660))]
    pub days: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceItemResponse {
    pub id: InvoiceItemId,
    pub invoice_id: InvoiceId,
    pub subscription_id: SubscriptionId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub rate: Decimal,
    pub currency: Currency,
}

impl From<InvoiceItem> for InvoiceItemResponse {
    fn from(item: InvoiceItem) -> Self {
        Self {
            id: item.id,
            invoice_id: item.invoice_id,
            subscription_id: item.subscription_id,
            start_date: item.start_date,
            end_date: item.end_date,
            description: item.description,
            amount: item.amount,
            rate: item.rate,
            currency: item.currency,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoicePaymentResponse {
    pub payment_id: PaymentId,
    pub payment_attempt_date: DateTime<Utc>,
    pub outcome: PaymentOutcome,
    pub amount: Option<Decimal>,
}

impl From<InvoicePayment> for InvoicePaymentResponse {
    fn from(payment: InvoicePayment) -> Self {
        Self {
            payment_id: payment.payment_id,
            payment_attempt_date: payment.payment_attempt_date,
            outcome: payment.outcome,
            amount: payment.amount.map(|m| m.amount()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceResponse {
    pub id: InvoiceId,
    pub account_id: AccountId,
    pub invoice_date: DateTime<Utc>,
    pub target_date: NaiveDate,
    pub currency: Currency,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub balance: Decimal,
    pub last_payment_attempt: Option<DateTime<Utc>>,
    pub items: Vec<InvoiceItemResponse>,
    pub payments: Vec<InvoicePaymentResponse>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            account_id: invoice.account_id,
            invoice_date: invoice.invoice_date,
            target_date: invoice.target_date,
            currency: invoice.currency,
            total_amount: invoice.total_amount().amount(),
            amount_paid: invoice.amount_paid().amount(),
            balance: invoice.balance().amount(),
            last_payment_attempt: invoice.last_payment_attempt(),
            items: invoice.items.into_iter().map(Into::into).collect(),
            payments: invoice.payments.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateInvoiceResponse {
    pub id: InvoiceId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueInvoicesResponse {
    pub invoice_ids: Vec<InvoiceId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            id: None,
            account_id: Uuid::new_v4(),
            invoice_date: None,
            target_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            currency: "usd".to_string(),
            items: vec![CreateInvoiceItemRequest {
                subscription_id: Uuid::new_v4(),
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                description: "Pro plan".to_string(),
                amount: dec!(29.95),
                rate: None,
            }],
        }
    }

    #[test]
    fn test_request_builds_linked_invoice() {
        let invoice = request().into_invoice().unwrap();

        assert_eq!(invoice.currency, Currency::USD);
        assert_eq!(invoice.items.len(), 1);
        assert_eq!(invoice.items[0].rate, dec!(29.95));
        assert!(invoice.validate().is_ok());
    }

    #[test]
    fn test_inverted_period_is_rejected() {
        let mut req = request();
        req.items[0].end_date = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();

        assert!(matches!(req.into_invoice(), Err(ApiError::Validation(..))));
    }

    #[test]
    fn test_empty_description_fails_validation() {
        let mut req = request();
        req.items[0].description.clear();

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_response_carries_balance() {
        let invoice = request().into_invoice().unwrap();
        let response = InvoiceResponse::from(invoice);

        assert_eq!(response.balance, dec!(29.95));
        assert_eq!(response.amount_paid, Decimal::ZERO);
        assert!(response.payments.is_empty());
    }
}
