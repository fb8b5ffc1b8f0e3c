//! Invoice line items

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::money::{fits_amount_column, AMOUNT_SCALE};
use core_kernel::{CoreError, Currency, InvoiceId, InvoiceItemId, Money, SubscriptionId};

/// One billed line on an invoice
///
/// Every item belongs to exactly one invoice and records the subscription
/// and service period it charges for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    /// Item ID
    pub id: InvoiceItemId,
    /// Owning invoice
    pub invoice_id: InvoiceId,
    /// Subscription being charged
    pub subscription_id: SubscriptionId,
    /// First day of the service period
    pub start_date: NaiveDate,
    /// Last day of the service period
    pub end_date: NaiveDate,
    /// Description shown on the invoice
    pub description: String,
    /// Amount charged for the period
    pub amount: Decimal,
    /// Rate the amount was derived from
    pub rate: Decimal,
    /// Currency of amount and rate
    pub currency: Currency,
}

impl InvoiceItem {
    /// Creates a new invoice item charging `amount` at `rate`
    ///
    /// Both values are rounded to `AMOUNT_SCALE` places, the precision the
    /// store keeps.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        invoice_id: InvoiceId,
        subscription_id: SubscriptionId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        description: impl Into<String>,
        amount: Decimal,
        rate: Decimal,
        currency: Currency,
    ) -> Self {
        Self {
            id: InvoiceItemId::new_v7(),
            invoice_id,
            subscription_id,
            start_date,
            end_date,
            description: description.into(),
            amount: amount.round_dp(AMOUNT_SCALE),
            rate: rate.round_dp(AMOUNT_SCALE),
            currency,
        }
    }

    /// Returns the charged amount as Money
    pub fn money(&self) -> Money {
        Money::new(self.amount, self.currency)
    }

    /// Number of days in the service period, both ends included
    pub fn period_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Checks that amount and rate fit the amount columns unchanged
    pub fn check_amounts(&self) -> Result<(), CoreError> {
        for value in [self.amount, self.rate] {
            if !fits_amount_column(value) {
                return Err(CoreError::AmountOutOfRange {
                    child: format!("item {}", self.id),
                    amount: value,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_item_money_and_period() {
        let item = InvoiceItem::new(
            InvoiceId::new(),
            SubscriptionId::new(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            "Monthly plan",
            dec!(29.95),
            dec!(29.95),
            Currency::USD,
        );

        assert_eq!(item.money(), Money::new(dec!(29.95), Currency::USD));
        assert_eq!(item.period_days(), 31);
    }

    #[test]
    fn test_item_amounts_keep_stored_precision() {
        let item = InvoiceItem::new(
            InvoiceId::new(),
            SubscriptionId::new(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            "Metered usage",
            dec!(1.23456),
            dec!(0.000049),
            Currency::USD,
        );

        assert_eq!(item.amount, dec!(1.2346));
        assert_eq!(item.rate, dec!(0.0000));
        assert!(item.check_amounts().is_ok());
    }

    #[test]
    fn test_check_amounts_rejects_overflowing_column() {
        let mut item = InvoiceItem::new(
            InvoiceId::new(),
            SubscriptionId::new(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            "Enterprise plan",
            dec!(1000000000000000),
            dec!(1),
            Currency::USD,
        );
        assert!(matches!(item.check_amounts(), Err(CoreError::AmountOutOfRange { .. })));

        item.amount = dec!(10);
        item.rate = dec!(0.12345);
        assert!(matches!(item.check_amounts(), Err(CoreError::AmountOutOfRange { .. })));
    }
}
