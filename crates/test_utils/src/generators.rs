//! Property-Based Test Generators
//!
//! Proptest strategies for invoices and their parts.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use core_kernel::{AccountId, Currency, InvoiceId, SubscriptionId};
use domain_invoice::Invoice;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::builders::TestInvoiceBuilder;

/// Strategy for generating any supported currency
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop::sample::select(Currency::ALL.to_vec())
}

/// Strategy for generating positive amounts with two decimal places
pub fn positive_amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for generating dates within 2024
pub fn date_2024_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..366i64).prop_map(|days| {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(days)
    })
}

/// Strategy for generating whole-second timestamps within 2024
pub fn timestamp_2024_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..366 * 86_400).prop_map(|seconds| {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(seconds)
    })
}

/// Strategy for generating InvoiceId
pub fn invoice_id_strategy() -> impl Strategy<Value = InvoiceId> {
    any::<[u8; 16]>().prop_map(|bytes| InvoiceId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}

/// Strategy for generating AccountId
pub fn account_id_strategy() -> impl Strategy<Value = AccountId> {
    any::<[u8; 16]>().prop_map(|bytes| AccountId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}

/// Strategy for generating SubscriptionId
pub fn subscription_id_strategy() -> impl Strategy<Value = SubscriptionId> {
    any::<[u8; 16]>().prop_map(|bytes| SubscriptionId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}

/// Strategy for generating invoices with items and optional partial payment
///
/// Generated invoices always carry at least one item. The paid fraction is
/// 0% to 100% of the total, so some invoices are settled and some are not.
pub fn invoice_strategy() -> impl Strategy<Value = Invoice> {
    (
        invoice_id_strategy(),
        account_id_strategy(),
        timestamp_2024_strategy(),
        date_2024_strategy(),
        currency_strategy(),
        prop::collection::vec(positive_amount_strategy(), 1..5),
        0u32..=100u32,
    )
        .prop_map(|(id, account_id, invoice_date, target_date, currency, amounts, paid_pct)| {
            let total: Decimal = amounts.iter().copied().sum();
            let paid = (total * Decimal::from(paid_pct) / Decimal::from(100)).round_dp(2);

            let mut builder = TestInvoiceBuilder::new()
                .with_id(id)
                .with_account_id(account_id)
                .with_invoice_date(invoice_date)
                .with_target_date(target_date)
                .with_currency(currency);
            for amount in amounts {
                builder = builder.with_item(amount);
            }
            if paid > Decimal::ZERO {
                builder = builder.with_successful_payment(paid, invoice_date);
            }
            builder.build()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_generated_invoices_are_consistent(invoice in invoice_strategy()) {
            prop_assert!(invoice.validate().is_ok());
            prop_assert!(!invoice.items.is_empty());
            prop_assert!(!invoice.balance().is_negative());
        }

        #[test]
        fn test_positive_amounts(amount in positive_amount_strategy()) {
            prop_assert!(amount > Decimal::ZERO);
        }
    }
}
