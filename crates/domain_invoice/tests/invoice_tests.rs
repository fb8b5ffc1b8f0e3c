//! Invoice model tests
//!
//! Balance arithmetic, payment history and due-window checks.

use chrono::NaiveDate;
use core_kernel::{Currency, PaymentId};
use domain_invoice::{InvoicePayment, PaymentOutcome};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use test_utils::{
    assert_balance, date_2024_strategy, invoice_strategy, DateFixtures, TestInvoiceBuilder,
    TestInvoiceItemBuilder,
};

mod balance {
    use super::*;

    #[test]
    fn test_invoice_without_items_has_zero_balance() {
        let invoice = TestInvoiceBuilder::new().build();

        assert!(invoice.total_amount().is_zero());
        assert_balance(&invoice, Decimal::ZERO);
        assert!(!invoice.is_outstanding());
    }

    #[test]
    fn test_balance_is_total_minus_successful_payments() {
        let invoice = TestInvoiceBuilder::new()
            .with_item(dec!(29.95))
            .with_item(dec!(5.00))
            .with_successful_payment(dec!(10.00), DateFixtures::payment_date())
            .build();

        assert_eq!(invoice.total_amount().amount(), dec!(34.95));
        assert_eq!(invoice.amount_paid().amount(), dec!(10.00));
        assert_balance(&invoice, dec!(24.95));
        assert!(invoice.is_outstanding());
    }

    #[test]
    fn test_failed_payment_does_not_reduce_balance() {
        let invoice = TestInvoiceBuilder::new()
            .with_item(dec!(50))
            .with_failed_payment(DateFixtures::payment_date())
            .build();

        assert_balance(&invoice, dec!(50));
        assert_eq!(invoice.payments.len(), 1);
        assert_eq!(invoice.payments[0].outcome, PaymentOutcome::Failed);
    }

    #[test]
    fn test_settled_invoice_is_not_outstanding() {
        let invoice = TestInvoiceBuilder::new()
            .with_item(dec!(20))
            .with_successful_payment(dec!(20), DateFixtures::payment_date())
            .build();

        assert_balance(&invoice, Decimal::ZERO);
        assert!(!invoice.is_outstanding());
    }

    #[test]
    fn test_overpaid_invoice_has_negative_balance() {
        let invoice = TestInvoiceBuilder::new()
            .with_item(dec!(20))
            .with_successful_payment(dec!(25), DateFixtures::payment_date())
            .build();

        assert!(invoice.balance().is_negative());
        assert!(!invoice.is_outstanding());
    }
}

mod payments {
    use super::*;

    #[test]
    fn test_last_payment_attempt_is_latest_of_any_outcome() {
        let invoice = TestInvoiceBuilder::new()
            .with_item(dec!(20))
            .with_successful_payment(dec!(5), DateFixtures::payment_date())
            .with_failed_payment(DateFixtures::retry_date())
            .build();

        assert_eq!(invoice.last_payment_attempt(), Some(DateFixtures::retry_date()));
    }

    #[test]
    fn test_appended_payment_changes_balance() {
        let mut invoice = TestInvoiceBuilder::new().with_item(dec!(40)).build();
        let payment = InvoicePayment::succeeded(
            invoice.id,
            PaymentId::new(),
            core_kernel::Money::new(dec!(15), Currency::USD),
            DateFixtures::payment_date(),
        );

        invoice.add_payments(vec![payment]);

        assert_balance(&invoice, dec!(25));
    }
}

mod validation {
    use super::*;

    #[test]
    fn test_item_from_other_invoice_is_rejected() {
        let mut invoice = TestInvoiceBuilder::new().with_item(dec!(10)).build();
        let stray = TestInvoiceItemBuilder::new(dec!(3)).build(core_kernel::InvoiceId::new(), Currency::USD);
        invoice.add_invoice_items(vec![stray]);

        assert!(invoice.validate().is_err());
    }

    #[test]
    fn test_item_in_other_currency_is_rejected() {
        let mut invoice = TestInvoiceBuilder::new().with_item(dec!(10)).build();
        let foreign = TestInvoiceItemBuilder::new(dec!(3)).build(invoice.id, Currency::GBP);
        invoice.add_invoice_items(vec![foreign]);

        assert!(invoice.validate().is_err());
    }
}

mod due_window {
    use super::*;

    fn due_on(date: NaiveDate) -> domain_invoice::Invoice {
        TestInvoiceBuilder::new()
            .with_target_date(date)
            .with_item(dec!(10))
            .build()
    }

    #[test]
    fn test_window_includes_both_ends() {
        let from = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        assert!(due_on(from).is_due_within(from, 7));
        assert!(due_on(NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()).is_due_within(from, 7));
        assert!(!due_on(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()).is_due_within(from, 7));
        assert!(!due_on(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()).is_due_within(from, 7));
    }

    #[test]
    fn test_zero_day_window_is_single_day() {
        let from = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        assert!(due_on(from).is_due_within(from, 0));
        assert!(!due_on(from.succ_opt().unwrap()).is_due_within(from, 0));
    }

    proptest! {
        #[test]
        fn test_window_matches_day_distance(
            target in date_2024_strategy(),
            from in date_2024_strategy(),
            days in 0u32..60u32,
        ) {
            let invoice = due_on(target);
            let distance = (target - from).num_days();
            let expected = distance >= 0 && distance <= i64::from(days);
            prop_assert_eq!(invoice.is_due_within(from, days), expected);
        }
    }
}

proptest! {
    #[test]
    fn test_balance_never_exceeds_total(invoice in invoice_strategy()) {
        prop_assert!(invoice.balance().amount() <= invoice.total_amount().amount());
        prop_assert_eq!(
            invoice.balance().amount(),
            invoice.total_amount().amount() - invoice.amount_paid().amount()
        );
    }
}
