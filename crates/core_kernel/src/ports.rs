//! Ports and Adapters Infrastructure
//!
//! Domain crates declare port traits (for example `InvoiceDao` and
//! `InvoiceEventBus` in `domain_invoice`) that extend the marker trait here.
//! Adapters in the infrastructure crates implement them against PostgreSQL or
//! an in-process bus, and report failures through `PortError`.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │        InvoiceUserApi        │
//! └──────────────────────────────┘
//!                │
//!                ▼
//! ┌──────────────────────────────┐
//! │   InvoiceDao / EventBus      │
//! │   (ports, domain_invoice)    │
//! └──────────────────────────────┘
//!        ▲                 ▲
//!        │                 │
//! ┌──────┴───────┐  ┌──────┴───────┐
//! │  PostgreSQL  │  │   In-memory  │
//! │  (infra_db)  │  │    (mock)    │
//! └──────────────┘  └──────────────┘
//! ```

use std::fmt;
use thiserror::Error;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::MoneyError;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Error type for port operations
///
/// Adapters keep the failure they observed as the `source`, so callers can
/// still reach the original store or bus error.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// A validation error occurred
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The operation conflicts with existing data
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// The relational store rejected or failed the operation
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Publishing to the event bus failed
    #[error("Event publication failed: {message}")]
    Publish {
        message: String,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Validation error with field information
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps a store failure, keeping it as the error source
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PortError::Storage {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a Publish error
    pub fn publish(message: impl Into<String>) -> Self {
        PortError::Publish {
            message: message.into(),
        }
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    /// Returns true if the failure came from the connection layer
    pub fn is_connection_error(&self) -> bool {
        matches!(self, PortError::Connection { .. })
    }
}

/// Kernel check failures surface as validation errors, tagged with the
/// offending field where there is one
impl From<CoreError> for PortError {
    fn from(err: CoreError) -> Self {
        let field = match &err {
            CoreError::Money(MoneyError::Overflow) | CoreError::AmountOutOfRange { .. } => Some("amount"),
            CoreError::Money(_) | CoreError::CurrencyMismatch { .. } => Some("currency"),
            _ => None,
        };
        PortError::Validation {
            message: err.to_string(),
            field: field.map(str::to_string),
        }
    }
}

/// Marker trait for all domain ports
///
/// All port traits extend this marker so they can be shared as
/// `Arc<dyn Port>` across async tasks.
pub trait DomainPort: Send + Sync + 'static {}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    /// Adapter is healthy and operational
    Healthy,
    /// Adapter is unhealthy and not operational
    Unhealthy,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Adapter identifier
    pub adapter_id: String,
    /// Current health status
    pub status: AdapterHealth,
    /// Latency of the health check in milliseconds
    pub latency_ms: u64,
    /// Optional message with additional details
    pub message: Option<String>,
    /// Timestamp of the health check
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl HealthCheckResult {
    /// Builds a healthy result for `adapter_id`
    pub fn healthy(adapter_id: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Healthy,
            latency_ms,
            message: None,
            checked_at: chrono::Utc::now(),
        }
    }

    /// Builds an unhealthy result carrying the failure message
    pub fn unhealthy(adapter_id: impl Into<String>, latency_ms: u64, message: impl Into<String>) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Unhealthy,
            latency_ms,
            message: Some(message.into()),
            checked_at: chrono::Utc::now(),
        }
    }

    /// Returns true when the adapter can serve requests
    pub fn is_healthy(&self) -> bool {
        self.status == AdapterHealth::Healthy
    }
}

/// Trait for adapters that support health checks
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Performs a health check on the adapter
    async fn health_check(&self) -> HealthCheckResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, Error)]
    #[error("relation \"invoices\" does not exist")]
    struct FakeStoreError;

    #[test]
    fn test_port_error_not_found() {
        let error = PortError::not_found("Invoice", "123");
        assert!(error.is_not_found());
        assert!(error.to_string().contains("Invoice"));
        assert!(error.to_string().contains("123"));
    }

    #[test]
    fn test_storage_error_keeps_source() {
        let error = PortError::storage(FakeStoreError);
        assert!(error.to_string().contains("invoices"));
        let source = error.source().expect("source should be kept");
        assert_eq!(source.to_string(), FakeStoreError.to_string());
    }

    #[test]
    fn test_health_result_helpers() {
        assert!(HealthCheckResult::healthy("pg", 3).is_healthy());
        let down = HealthCheckResult::unhealthy("pg", 3, "refused");
        assert!(!down.is_healthy());
        assert_eq!(down.message.as_deref(), Some("refused"));
    }
}
