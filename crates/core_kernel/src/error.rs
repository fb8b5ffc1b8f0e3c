//! Kernel error type
//!
//! Raised by value-level checks (money arithmetic, identifier parsing,
//! invoice consistency) before anything reaches a port.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::money::{Currency, MoneyError};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] uuid::Error),

    /// A line or payment is attached to a different invoice
    #[error("{child} belongs to invoice {owner}, not {expected}")]
    ForeignChild {
        child: String,
        owner: String,
        expected: String,
    },

    #[error("{child} is in {found}, invoice is in {expected}")]
    CurrencyMismatch {
        child: String,
        found: Currency,
        expected: Currency,
    },

    #[error("{child} ends on {end}, before it starts on {start}")]
    InvertedPeriod {
        child: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// The amount would be rounded or overflow in a `NUMERIC(19, 4)` column
    #[error("{child} amount {amount} cannot be stored at 4 decimal places")]
    AmountOutOfRange {
        child: String,
        amount: Decimal,
    },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    /// True for the invoice consistency failures
    pub fn is_inconsistent_invoice(&self) -> bool {
        matches!(
            self,
            CoreError::ForeignChild { .. }
                | CoreError::CurrencyMismatch { .. }
                | CoreError::InvertedPeriod { .. }
                | CoreError::AmountOutOfRange { .. }
        )
    }
}
