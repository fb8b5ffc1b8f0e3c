//! Payment history
//!
//! Each payment attempt against an invoice is appended as an
//! `InvoicePayment`. Failed attempts carry no amount and never reduce the
//! balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::money::fits_amount_column;
use core_kernel::{CoreError, Currency, InvoiceId, Money, PaymentId};

/// Outcome of a payment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// Funds were collected
    Succeeded,
    /// The attempt was declined or errored
    Failed,
}

impl PaymentOutcome {
    /// Returns the value stored in the `outcome` column
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentOutcome::Succeeded => "succeeded",
            PaymentOutcome::Failed => "failed",
        }
    }

    /// Parses the stored column value
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "succeeded" => Some(PaymentOutcome::Succeeded),
            "failed" => Some(PaymentOutcome::Failed),
            _ => None,
        }
    }
}

/// A recorded payment attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicePayment {
    /// Invoice the attempt was made against
    pub invoice_id: InvoiceId,
    /// Payment identifier from the payment system
    pub payment_id: PaymentId,
    /// When the attempt was made
    pub payment_attempt_date: DateTime<Utc>,
    /// Succeeded or failed
    pub outcome: PaymentOutcome,
    /// Collected amount, present only for successful attempts
    pub amount: Option<Money>,
}

impl InvoicePayment {
    /// Records a successful payment of `amount`
    pub fn succeeded(
        invoice_id: InvoiceId,
        payment_id: PaymentId,
        amount: Money,
        payment_date: DateTime<Utc>,
    ) -> Self {
        Self {
            invoice_id,
            payment_id,
            payment_attempt_date: payment_date,
            outcome: PaymentOutcome::Succeeded,
            amount: Some(amount),
        }
    }

    /// Records a failed payment attempt
    pub fn failed(
        invoice_id: InvoiceId,
        payment_id: PaymentId,
        payment_attempt_date: DateTime<Utc>,
    ) -> Self {
        Self {
            invoice_id,
            payment_id,
            payment_attempt_date,
            outcome: PaymentOutcome::Failed,
            amount: None,
        }
    }

    /// Returns true when funds were collected
    pub fn is_successful(&self) -> bool {
        self.outcome == PaymentOutcome::Succeeded
    }

    /// Amount that counts against the invoice balance
    pub fn collected(&self) -> Option<Money> {
        if self.is_successful() {
            self.amount
        } else {
            None
        }
    }

    /// Checks that the collected amount can be applied to an invoice billed
    /// in `currency` and stored without loss
    ///
    /// # Errors
    ///
    /// `CoreError::CurrencyMismatch` or `CoreError::AmountOutOfRange`.
    pub fn check_amount(&self, currency: Currency) -> Result<(), CoreError> {
        let Some(amount) = self.amount else {
            return Ok(());
        };
        let child = || format!("payment {}", self.payment_id);
        if amount.currency() != currency {
            return Err(CoreError::CurrencyMismatch {
                child: child(),
                found: amount.currency(),
                expected: currency,
            });
        }
        if !fits_amount_column(amount.amount()) {
            return Err(CoreError::AmountOutOfRange {
                child: child(),
                amount: amount.amount(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_outcome_column_values() {
        for outcome in [PaymentOutcome::Succeeded, PaymentOutcome::Failed] {
            assert_eq!(PaymentOutcome::parse(outcome.as_str()), Some(outcome));
        }
        assert_eq!(PaymentOutcome::parse("pending"), None);
    }

    #[test]
    fn test_failed_payment_collects_nothing() {
        let payment = InvoicePayment::failed(InvoiceId::new(), PaymentId::new(), Utc::now());
        assert!(!payment.is_successful());
        assert_eq!(payment.collected(), None);
    }

    #[test]
    fn test_successful_payment_collects_amount() {
        let amount = Money::new(dec!(42.00), Currency::EUR);
        let payment = InvoicePayment::succeeded(InvoiceId::new(), PaymentId::new(), amount, Utc::now());
        assert_eq!(payment.collected(), Some(amount));
    }

    #[test]
    fn test_check_amount_rejects_other_currency() {
        let amount = Money::new(dec!(100), Currency::JPY);
        let payment = InvoicePayment::succeeded(InvoiceId::new(), PaymentId::new(), amount, Utc::now());

        assert!(payment.check_amount(Currency::JPY).is_ok());
        let err = payment.check_amount(Currency::USD).unwrap_err();
        assert!(matches!(
            err,
            CoreError::CurrencyMismatch { found: Currency::JPY, expected: Currency::USD, .. }
        ));
    }

    #[test]
    fn test_check_amount_rejects_unstorable_amount() {
        let amount = Money::new(dec!(1000000000000000), Currency::USD);
        let payment = InvoicePayment::succeeded(InvoiceId::new(), PaymentId::new(), amount, Utc::now());
        assert!(matches!(
            payment.check_amount(Currency::USD),
            Err(CoreError::AmountOutOfRange { .. })
        ));

        let failed = InvoicePayment::failed(InvoiceId::new(), PaymentId::new(), Utc::now());
        assert!(failed.check_amount(Currency::GBP).is_ok());
    }
}
