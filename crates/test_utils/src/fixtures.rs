//! Test Fixtures
//!
//! Fixed, deterministic values for invoices, items and payments. Timestamps
//! are whole seconds so they survive a round trip through PostgreSQL
//! `TIMESTAMPTZ` unchanged.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{AccountId, Currency, Money, SubscriptionId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Fixture for money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Monthly plan charge in USD
    pub fn usd_plan_charge() -> Money {
        Money::new(dec!(29.95), Currency::USD)
    }

    /// Add-on charge in USD
    pub fn usd_addon_charge() -> Money {
        Money::new(dec!(5.00), Currency::USD)
    }

    /// Monthly plan charge in EUR
    pub fn eur_plan_charge() -> Money {
        Money::new(dec!(24.50), Currency::EUR)
    }

    /// Zero USD
    pub fn zero_usd() -> Money {
        Money::zero(Currency::USD)
    }
}

/// Fixture for billing dates
pub struct DateFixtures;

impl DateFixtures {
    /// Date the standard invoice was issued
    pub fn invoice_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap()
    }

    /// Date the standard invoice is due
    pub fn target_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    /// First day of the standard service period
    pub fn period_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    /// Last day of the standard service period
    pub fn period_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    /// A payment attempt a few days after issue
    pub fn payment_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap()
    }

    /// A later payment attempt
    pub fn retry_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 8, 12, 0, 0).unwrap()
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// Creates a deterministic account ID for testing
    pub fn account_id() -> AccountId {
        AccountId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440004").unwrap())
    }

    /// Creates a deterministic subscription ID for testing
    pub fn subscription_id() -> SubscriptionId {
        SubscriptionId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440007").unwrap())
    }
}

/// Fixture for decimal test data
pub struct DecimalFixtures;

impl DecimalFixtures {
    /// Zero for comparison tests
    pub fn zero() -> Decimal {
        Decimal::ZERO
    }

    /// Small epsilon for rounding comparisons
    pub fn epsilon() -> Decimal {
        dec!(0.0001)
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    /// Description of the standard plan item
    pub fn plan_description() -> &'static str {
        "Pro plan - monthly"
    }

    /// Description of the standard add-on item
    pub fn addon_description() -> &'static str {
        "Extra storage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_dates_are_ordered() {
        assert!(DateFixtures::period_start() <= DateFixtures::period_end());
        assert!(DateFixtures::invoice_date() < DateFixtures::payment_date());
        assert!(DateFixtures::payment_date() < DateFixtures::retry_date());
    }

    #[test]
    fn test_fixture_ids_are_stable() {
        assert_eq!(IdFixtures::account_id(), IdFixtures::account_id());
        assert_eq!(IdFixtures::subscription_id(), IdFixtures::subscription_id());
    }
}
