//! Core Kernel - Foundational types for the invoicing system
//!
//! This crate provides the building blocks shared by every other crate:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers for invoices, accounts, subscriptions and payments
//! - Port error and health-check types used by adapters

pub mod money;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{Money, Currency, MoneyError};
pub use identifiers::{
    InvoiceId, InvoiceItemId, AccountId, SubscriptionId, PaymentId,
};
pub use error::CoreError;
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
