//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::money::MoneyError;
use core_kernel::{Currency, InvoiceId, PortError};

#[test]
fn test_core_error_validation() {
    let error = CoreError::validation("Invoice has no items");

    match error {
        CoreError::Validation(msg) => assert_eq!(msg, "Invoice has no items"),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_core_error_from_money_error() {
    let money_error = MoneyError::CurrencyMismatch("USD".to_string(), "EUR".to_string());
    let core_error: CoreError = money_error.into();

    assert!(matches!(core_error, CoreError::Money(_)));
    assert!(core_error.to_string().contains("Currency mismatch"));
}

#[test]
fn test_core_error_from_bad_identifier() {
    let parse_error = "not-a-uuid".parse::<InvoiceId>().unwrap_err();
    let core_error: CoreError = parse_error.into();

    assert!(matches!(core_error, CoreError::InvalidIdentifier(_)));
}

#[test]
fn test_core_error_names_the_offending_child() {
    let error = CoreError::CurrencyMismatch {
        child: "item 42".to_string(),
        found: Currency::GBP,
        expected: Currency::USD,
    };

    assert_eq!(error.to_string(), "item 42 is in GBP, invoice is in USD");
    assert!(error.is_inconsistent_invoice());
    assert!(!CoreError::validation("x").is_inconsistent_invoice());
}

#[test]
fn test_port_error_variants() {
    assert!(PortError::not_found("Invoice", "x").is_not_found());
    assert!(PortError::connection("refused").is_connection_error());
    assert!(!PortError::publish("bus closed").is_not_found());

    let field_error = PortError::validation_field("must be positive", "amount");
    match field_error {
        PortError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("amount")),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_core_error_becomes_field_validation() {
    let mismatch: PortError = CoreError::CurrencyMismatch {
        child: "payment 7".to_string(),
        found: Currency::JPY,
        expected: Currency::USD,
    }
    .into();
    match mismatch {
        PortError::Validation { message, field } => {
            assert_eq!(message, "payment 7 is in JPY, invoice is in USD");
            assert_eq!(field.as_deref(), Some("currency"));
        }
        other => panic!("Expected Validation error, got {:?}", other),
    }

    let plain: PortError = CoreError::validation("empty").into();
    assert!(matches!(plain, PortError::Validation { field: None, .. }));
}
