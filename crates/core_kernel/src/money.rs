//! Money types with precise decimal arithmetic
//!
//! Invoice totals, payments and balances are all `Money`: a `rust_decimal`
//! amount tagged with an ISO 4217 currency. Arithmetic across currencies is
//! an error, never a conversion.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Scale kept on stored amounts, matching the `NUMERIC(19, 4)` columns
pub const AMOUNT_SCALE: u32 = 4;

/// Exclusive bound on stored magnitudes: `NUMERIC(19, 4)` keeps 15 integer digits
const AMOUNT_COLUMN_LIMIT: i64 = 1_000_000_000_000_000;

/// Returns true if `amount` can be stored in an amount column without
/// rounding or overflow
pub fn fits_amount_column(amount: Decimal) -> bool {
    amount.round_dp(AMOUNT_SCALE) == amount && amount.abs() < Decimal::from(AMOUNT_COLUMN_LIMIT)
}

/// Currencies an invoice can be billed in (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    JPY,
    CHF,
    INR,
    AUD,
    CAD,
    SGD,
    HKD,
}

impl Currency {
    pub const ALL: [Currency; 10] = [
        Currency::USD,
        Currency::EUR,
        Currency::GBP,
        Currency::JPY,
        Currency::CHF,
        Currency::INR,
        Currency::AUD,
        Currency::CAD,
        Currency::SGD,
        Currency::HKD,
    ];

    /// Minor unit digits
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Three-letter code, as stored in the `currency` columns
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CHF => "CHF",
            Currency::INR => "INR",
            Currency::AUD => "AUD",
            Currency::CAD => "CAD",
            Currency::SGD => "SGD",
            Currency::HKD => "HKD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    /// Parses an ISO 4217 code, ignoring surrounding whitespace and case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Currency::ALL
            .iter()
            .copied()
            .find(|c| c.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| MoneyError::UnknownCurrency(code.to_string()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    #[error("Amount overflow")]
    Overflow,
}

/// A monetary amount with associated currency
///
/// Amounts are rounded to `AMOUNT_SCALE` places on construction so a value
/// reads back from the store unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(AMOUNT_SCALE),
            currency,
        }
    }

    /// Builds an amount from a currency code, as received at the boundary
    pub fn of(amount: Decimal, code: &str) -> Result<Self, MoneyError> {
        Ok(Self::new(amount, code.parse()?))
    }

    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Sums amounts that must all be in `currency`
    ///
    /// An empty iterator yields zero in `currency`.
    pub fn sum<'a, I>(currency: Currency, items: I) -> Result<Money, MoneyError>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        items
            .into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.checked_add(m))
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Rounds to the currency's minor unit
    pub fn round_to_currency(&self) -> Self {
        Self {
            amount: self.amount.round_dp(self.currency.decimal_places()),
            currency: self.currency,
        }
    }

    fn same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ))
        }
    }

    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.same_currency(other)?;
        let amount = self.amount.checked_add(other.amount).ok_or(MoneyError::Overflow)?;
        Ok(Self::new(amount, self.currency))
    }

    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.same_currency(other)?;
        let amount = self.amount.checked_sub(other.amount).ok_or(MoneyError::Overflow)?;
        Ok(Self::new(amount, self.currency))
    }
}

/// Formats as `12.50 USD`, at the currency's precision
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places() as usize;
        write!(f, "{:.dp$} {}", self.amount, self.currency, dp = dp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_creation() {
        let m = Money::new(dec!(100.50), Currency::USD);
        assert_eq!(m.amount(), dec!(100.50));
        assert_eq!(m.currency(), Currency::USD);
    }

    #[test]
    fn test_money_of_code() {
        let m = Money::of(dec!(12.5), "gbp").unwrap();
        assert_eq!(m.currency(), Currency::GBP);
        assert!(matches!(Money::of(dec!(1), "ZZZ"), Err(MoneyError::UnknownCurrency(_))));
    }

    #[test]
    fn test_currency_mismatch() {
        let usd = Money::new(dec!(100.00), Currency::USD);
        let eur = Money::new(dec!(100.00), Currency::EUR);

        let result = usd.checked_add(&eur);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("USD".parse::<Currency>().unwrap(), Currency::USD);
        assert_eq!(" eur ".parse::<Currency>().unwrap(), Currency::EUR);
        assert_eq!(
            "XYZ".parse::<Currency>(),
            Err(MoneyError::UnknownCurrency("XYZ".to_string()))
        );
    }

    #[test]
    fn test_sum_empty_is_zero() {
        let total = Money::sum(Currency::GBP, std::iter::empty()).unwrap();
        assert!(total.is_zero());
        assert_eq!(total.currency(), Currency::GBP);
    }

    #[test]
    fn test_sum_rejects_mixed_currencies() {
        let parts = [
            Money::new(dec!(10), Currency::USD),
            Money::new(dec!(5), Currency::EUR),
        ];
        assert!(Money::sum(Currency::USD, parts.iter()).is_err());
    }

    #[test]
    fn test_checked_add_reports_overflow() {
        let max = Money::new(Decimal::MAX, Currency::USD);
        assert_eq!(max.checked_add(&max), Err(MoneyError::Overflow));
        assert_eq!(
            Money::sum(Currency::USD, [max, max].iter()),
            Err(MoneyError::Overflow)
        );
    }

    #[test]
    fn test_amount_column_bounds() {
        assert!(fits_amount_column(dec!(999999999999999.9999)));
        assert!(fits_amount_column(dec!(-12.5000)));
        assert!(fits_amount_column(dec!(1.230000)));
        assert!(!fits_amount_column(dec!(1.23456)));
        assert!(!fits_amount_column(dec!(1000000000000000)));
        assert!(!fits_amount_column(Decimal::MAX));
    }
}
