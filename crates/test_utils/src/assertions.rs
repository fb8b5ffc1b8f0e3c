//! Custom Test Assertions
//!
//! Assertion helpers for invoices and money. Invoice comparison ignores the
//! order in which a store returns items and payments.

use core_kernel::Money;
use domain_invoice::{Invoice, InvoiceItem, InvoicePayment};
use rust_decimal::Decimal;

/// Asserts that two Money values are equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies differ or the amounts differ by more than tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: {} vs {}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money values differ by {}, which exceeds tolerance {}. Actual: {}, Expected: {}",
        diff,
        tolerance,
        actual,
        expected
    );
}

/// Asserts that the outstanding balance of an invoice equals `expected`
pub fn assert_balance(invoice: &Invoice, expected: Decimal) {
    assert_eq!(
        invoice.balance().amount(),
        expected,
        "Invoice {} has balance {}, expected {}",
        invoice.id,
        invoice.balance(),
        expected
    );
}

fn sorted_items(invoice: &Invoice) -> Vec<InvoiceItem> {
    let mut items = invoice.items.clone();
    items.sort_by_key(|i| i.id);
    items
}

fn sorted_payments(invoice: &Invoice) -> Vec<InvoicePayment> {
    let mut payments = invoice.payments.clone();
    payments.sort_by(|a, b| {
        a.payment_attempt_date
            .cmp(&b.payment_attempt_date)
            .then(a.payment_id.cmp(&b.payment_id))
    });
    payments
}

/// Asserts that two invoices hold the same header, items and payments
///
/// Decimal scale is ignored (`10.00` equals `10`), as is child ordering.
pub fn assert_invoice_matches(actual: &Invoice, expected: &Invoice) {
    assert_eq!(actual.id, expected.id, "Invoice id mismatch");
    assert_eq!(actual.account_id, expected.account_id, "Account mismatch on {}", expected.id);
    assert_eq!(actual.invoice_date, expected.invoice_date, "Invoice date mismatch on {}", expected.id);
    assert_eq!(actual.target_date, expected.target_date, "Target date mismatch on {}", expected.id);
    assert_eq!(actual.currency, expected.currency, "Currency mismatch on {}", expected.id);

    assert_eq!(
        sorted_items(actual),
        sorted_items(expected),
        "Items differ on invoice {}",
        expected.id
    );
    assert_eq!(
        sorted_payments(actual),
        sorted_payments(expected),
        "Payments differ on invoice {}",
        expected.id
    );
}

/// Asserts that a decimal value is approximately equal to another
pub fn assert_decimal_approx_eq(actual: Decimal, expected: Decimal, tolerance: Decimal) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "Decimal values differ by {}, which exceeds tolerance {}. Actual: {}, Expected: {}",
        diff,
        tolerance,
        actual,
        expected
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::TestInvoiceBuilder;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_assert_money_approx_eq_passes() {
        let a = Money::new(dec!(100.001), Currency::USD);
        let b = Money::new(dec!(100.002), Currency::USD);
        assert_money_approx_eq(&a, &b, dec!(0.01));
    }

    #[test]
    #[should_panic(expected = "Currency mismatch")]
    fn test_assert_money_approx_eq_fails_on_currency() {
        let a = Money::new(dec!(100), Currency::USD);
        let b = Money::new(dec!(100), Currency::EUR);
        assert_money_approx_eq(&a, &b, dec!(0.01));
    }

    #[test]
    fn test_assert_invoice_matches_ignores_child_order() {
        let invoice = TestInvoiceBuilder::new()
            .with_item(dec!(10))
            .with_item(dec!(20))
            .build();
        let mut reordered = invoice.clone();
        reordered.items.reverse();

        assert_invoice_matches(&reordered, &invoice);
    }

    #[test]
    #[should_panic(expected = "Items differ")]
    fn test_assert_invoice_matches_detects_missing_item() {
        let invoice = TestInvoiceBuilder::new().with_item(dec!(10)).build();
        let mut stripped = invoice.clone();
        stripped.items.clear();

        assert_invoice_matches(&stripped, &invoice);
    }
}
