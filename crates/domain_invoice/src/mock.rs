//! In-memory implementation of `InvoiceDao` for testing
//!
//! Mirrors the PostgreSQL adapter's observable behavior: creation is
//! idempotent and posts one event, a failed post leaves nothing stored,
//! payments are appended, and unknown ids read as `None`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use core_kernel::{
    AccountId, AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable,
    InvoiceId, Money, PaymentId, PortError, SubscriptionId,
};

use crate::events::{InvoiceCreationNotification, InvoiceEvent};
use crate::invoice::Invoice;
use crate::item::InvoiceItem;
use crate::payment::InvoicePayment;
use crate::ports::{InvoiceDao, InvoiceEventBus};

fn parse_key<T: std::str::FromStr>(value: &str, field: &str) -> Result<T, PortError> {
    value
        .parse()
        .map_err(|_| PortError::validation_field(format!("'{}' is not a valid key", value), field))
}

/// In-memory mock of the invoice DAO
#[derive(Clone)]
pub struct InMemoryInvoiceDao {
    invoices: Arc<RwLock<HashMap<InvoiceId, Invoice>>>,
    event_bus: Arc<dyn InvoiceEventBus>,
}

impl InMemoryInvoiceDao {
    /// Creates an empty store posting creation events to `event_bus`
    pub fn new(event_bus: Arc<dyn InvoiceEventBus>) -> Self {
        Self {
            invoices: Arc::new(RwLock::new(HashMap::new())),
            event_bus,
        }
    }

    /// Number of stored invoices
    pub async fn len(&self) -> usize {
        self.invoices.read().await.len()
    }

    /// Returns true when nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.invoices.read().await.is_empty()
    }

    async fn sorted(&self, filter: impl Fn(&Invoice) -> bool) -> Vec<Invoice> {
        let invoices = self.invoices.read().await;
        let mut found: Vec<Invoice> = invoices.values().filter(|i| filter(i)).cloned().collect();
        found.sort_by(|a, b| a.invoice_date.cmp(&b.invoice_date).then(a.id.cmp(&b.id)));
        found
    }

    async fn append_payment(&self, invoice_id: InvoiceId, payment: InvoicePayment) -> Result<(), PortError> {
        let mut invoices = self.invoices.write().await;
        let invoice = invoices
            .get_mut(&invoice_id)
            .ok_or_else(|| PortError::not_found("Invoice", invoice_id))?;
        payment.check_amount(invoice.currency)?;
        invoice.add_payments(vec![payment]);
        Ok(())
    }
}

impl DomainPort for InMemoryInvoiceDao {}

#[async_trait]
impl HealthCheckable for InMemoryInvoiceDao {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "mock-invoice-dao".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some("Mock adapter always healthy".to_string()),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl InvoiceDao for InMemoryInvoiceDao {
    async fn get_invoices(&self) -> Result<Vec<Invoice>, PortError> {
        Ok(self.sorted(|_| true).await)
    }

    async fn get_invoices_by_account(&self, account_id: &str) -> Result<Vec<Invoice>, PortError> {
        let account_id: AccountId = parse_key(account_id, "account_id")?;
        Ok(self.sorted(|i| i.account_id == account_id).await)
    }

    async fn get_invoice_items_by_account(&self, account_id: &str) -> Result<Vec<InvoiceItem>, PortError> {
        let account_id: AccountId = parse_key(account_id, "account_id")?;
        Ok(self
            .sorted(|i| i.account_id == account_id)
            .await
            .into_iter()
            .flat_map(|i| i.items)
            .collect())
    }

    async fn get_invoices_by_subscription(&self, subscription_id: &str) -> Result<Vec<Invoice>, PortError> {
        let subscription_id: SubscriptionId = parse_key(subscription_id, "subscription_id")?;
        Ok(self
            .sorted(|i| i.items.iter().any(|item| item.subscription_id == subscription_id))
            .await)
    }

    async fn get_by_id(&self, invoice_id: &str) -> Result<Option<Invoice>, PortError> {
        let invoice_id: InvoiceId = parse_key(invoice_id, "invoice_id")?;
        Ok(self.invoices.read().await.get(&invoice_id).cloned())
    }

    async fn create(&self, invoice: &Invoice) -> Result<(), PortError> {
        invoice.validate()?;

        let mut invoices = self.invoices.write().await;
        if invoices.contains_key(&invoice.id) {
            return Ok(());
        }

        // Post before storing so a failed post leaves no trace
        let notification = InvoiceCreationNotification::from_invoice(invoice);
        self.event_bus.post(InvoiceEvent::InvoiceCreated(notification)).await?;

        invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn get_invoices_for_payment(
        &self,
        target_date: NaiveDate,
        number_of_days: u32,
    ) -> Result<Vec<InvoiceId>, PortError> {
        let mut due = self
            .sorted(|i| i.is_outstanding() && i.is_due_within(target_date, number_of_days))
            .await;
        due.sort_by(|a, b| a.target_date.cmp(&b.target_date).then(a.id.cmp(&b.id)));
        Ok(due.into_iter().map(|i| i.id).collect())
    }

    async fn notify_successful_payment(
        &self,
        invoice_id: &str,
        amount: Decimal,
        currency: &str,
        payment_id: &str,
        payment_date: DateTime<Utc>,
    ) -> Result<(), PortError> {
        let invoice_id: InvoiceId = parse_key(invoice_id, "invoice_id")?;
        let payment_id: PaymentId = parse_key(payment_id, "payment_id")?;
        let amount = Money::of(amount, currency)
            .map_err(|e| PortError::validation_field(e.to_string(), "currency"))?;

        let payment = InvoicePayment::succeeded(
            invoice_id,
            payment_id,
            amount,
            payment_date,
        );
        self.append_payment(invoice_id, payment).await
    }

    async fn notify_failed_payment(
        &self,
        invoice_id: &str,
        payment_id: &str,
        payment_attempt_date: DateTime<Utc>,
    ) -> Result<(), PortError> {
        let invoice_id: InvoiceId = parse_key(invoice_id, "invoice_id")?;
        let payment_id: PaymentId = parse_key(payment_id, "payment_id")?;

        let payment = InvoicePayment::failed(invoice_id, payment_id, payment_attempt_date);
        self.append_payment(invoice_id, payment).await
    }
}

/// Event bus that rejects every post
///
/// Used to check that a failed notification aborts invoice creation.
#[derive(Debug, Clone, Default)]
pub struct FailingEventBus;

impl DomainPort for FailingEventBus {}

#[async_trait]
impl InvoiceEventBus for FailingEventBus {
    async fn post(&self, event: InvoiceEvent) -> Result<(), PortError> {
        Err(PortError::publish(format!(
            "bus unavailable for {}",
            event.event_type()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BroadcastEventBus;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn invoice() -> Invoice {
        let mut invoice = Invoice::new(
            AccountId::new(),
            Utc::now(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            Currency::USD,
        );
        invoice.add_invoice_items(vec![InvoiceItem::new(
            invoice.id,
            SubscriptionId::new(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
            "Plan",
            dec!(20),
            dec!(20),
            Currency::USD,
        )]);
        invoice
    }

    #[tokio::test]
    async fn test_mock_create_and_get() {
        let dao = InMemoryInvoiceDao::new(Arc::new(BroadcastEventBus::default()));
        let invoice = invoice();

        dao.create(&invoice).await.unwrap();

        let loaded = dao.get_by_id(&invoice.id.key()).await.unwrap();
        assert_eq!(loaded, Some(invoice));
    }

    #[tokio::test]
    async fn test_mock_failed_post_stores_nothing() {
        let dao = InMemoryInvoiceDao::new(Arc::new(FailingEventBus));

        let result = dao.create(&invoice()).await;

        assert!(matches!(result, Err(PortError::Publish { .. })));
        assert!(dao.is_empty().await);
    }

    #[tokio::test]
    async fn test_mock_rejects_malformed_key() {
        let dao = InMemoryInvoiceDao::new(Arc::new(BroadcastEventBus::default()));
        let result = dao.get_by_id("not-a-uuid").await;
        assert!(matches!(result, Err(PortError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_mock_payment_on_unknown_invoice() {
        let dao = InMemoryInvoiceDao::new(Arc::new(BroadcastEventBus::default()));
        let result = dao
            .notify_failed_payment(&InvoiceId::new().key(), &PaymentId::new().key(), Utc::now())
            .await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_mock_rejects_payment_in_other_currency() {
        let dao = InMemoryInvoiceDao::new(Arc::new(BroadcastEventBus::default()));
        let invoice = invoice();
        dao.create(&invoice).await.unwrap();

        let result = dao
            .notify_successful_payment(&invoice.id.key(), dec!(20), "JPY", &PaymentId::new().key(), Utc::now())
            .await;

        match result {
            Err(PortError::Validation { field, .. }) => assert_eq!(field.as_deref(), Some("currency")),
            other => panic!("Expected Validation error, got {:?}", other),
        }
        let stored = dao.get_by_id(&invoice.id.key()).await.unwrap().unwrap();
        assert!(stored.payments.is_empty());
        assert_eq!(stored.balance().amount(), dec!(20));
    }

    #[tokio::test]
    async fn test_mock_rejects_unstorable_item() {
        let dao = InMemoryInvoiceDao::new(Arc::new(BroadcastEventBus::default()));
        let mut invoice = invoice();
        invoice.items[0].amount = dec!(1000000000000000);

        let result = dao.create(&invoice).await;

        assert!(matches!(result, Err(PortError::Validation { .. })));
        assert!(dao.is_empty().await);
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let dao = InMemoryInvoiceDao::new(Arc::new(BroadcastEventBus::default()));
        assert_eq!(dao.health_check().await.status, AdapterHealth::Healthy);
    }
}
