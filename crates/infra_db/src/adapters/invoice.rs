//! PostgreSQL Invoice DAO
//!
//! Implements `InvoiceDao` over the invoice, item and payment repositories.
//! Each operation runs in a single transaction: reads in a read-only
//! snapshot, writes in a read-write transaction that is committed only after
//! every statement (and, for creation, the event post) succeeded.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use domain_invoice::{BroadcastEventBus, InvoiceDao};
//! use infra_db::adapters::PostgresInvoiceDao;
//!
//! let dao = PostgresInvoiceDao::new(pool, Arc::new(BroadcastEventBus::default()));
//! let invoice = dao.get_by_id(&invoice_id.key()).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, instrument, warn};

use core_kernel::{
    AccountId, Currency, DomainPort, HealthCheckResult, HealthCheckable, InvoiceId,
    Money, PaymentId, PortError, SubscriptionId,
};
use domain_invoice::{
    due_window_end, Invoice, InvoiceCreationNotification, InvoiceDao, InvoiceEvent,
    InvoiceEventBus, InvoiceItem, InvoicePayment,
};

use crate::error::DatabaseError;
use crate::repositories::{
    InvoiceItemRepository, InvoiceItemRow, InvoicePaymentRepository, InvoicePaymentRow,
    InvoiceRepository, InvoiceRow,
};
use crate::transaction::TransactionManager;

const ADAPTER_ID: &str = "postgres-invoice-dao";

/// Checks that a key is a well-formed identifier before it reaches SQL
fn parse_key<T: std::str::FromStr>(value: &str, field: &str) -> Result<T, PortError> {
    value
        .parse()
        .map_err(|_| PortError::validation_field(format!("'{}' is not a valid key", value), field))
}

/// Attaches items and payments to loaded invoice rows, preserving row order
async fn load_invoices(
    conn: &mut PgConnection,
    rows: Vec<InvoiceRow>,
) -> Result<Vec<Invoice>, DatabaseError> {
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();

    let mut items: HashMap<String, Vec<InvoiceItem>> = HashMap::new();
    for row in InvoiceItemRepository::find_by_invoices(conn, &ids).await? {
        let key = row.invoice_id.clone();
        items.entry(key).or_default().push(row.into_item()?);
    }

    let mut payments: HashMap<String, Vec<InvoicePayment>> = HashMap::new();
    for row in InvoicePaymentRepository::find_by_invoices(conn, &ids).await? {
        let key = row.invoice_id.clone();
        payments.entry(key).or_default().push(row.into_payment()?);
    }

    rows.into_iter()
        .map(|row| {
            let key = row.id.clone();
            let mut invoice = row.into_invoice()?;
            invoice.add_invoice_items(items.remove(&key).unwrap_or_default());
            invoice.add_payments(payments.remove(&key).unwrap_or_default());
            Ok(invoice)
        })
        .collect()
}

/// PostgreSQL-backed implementation of `InvoiceDao`
///
/// Database errors are translated to `PortError` with the
/// `DatabaseError` kept as the source. Event bus errors are returned as
/// they were raised and roll back the creation that triggered them.
#[derive(Clone)]
pub struct PostgresInvoiceDao {
    tx_manager: TransactionManager,
    event_bus: Arc<dyn InvoiceEventBus>,
}

impl PostgresInvoiceDao {
    /// Creates a DAO over `pool` that announces new invoices on `event_bus`
    pub fn new(pool: PgPool, event_bus: Arc<dyn InvoiceEventBus>) -> Self {
        Self::with_transaction_manager(TransactionManager::new(pool), event_bus)
    }

    /// Creates a DAO with explicitly configured transactions
    pub fn with_transaction_manager(
        tx_manager: TransactionManager,
        event_bus: Arc<dyn InvoiceEventBus>,
    ) -> Self {
        Self { tx_manager, event_bus }
    }

    /// Appends a payment attempt after checking it against the stored
    /// invoice, in one write transaction
    async fn append_payment(&self, payment: &InvoicePayment) -> Result<(), PortError> {
        let row = InvoicePaymentRow::from_payment(payment);
        let mut tx = self.tx_manager.begin_write().await?;

        let code = InvoiceRepository::find_currency(&mut tx, &row.invoice_id)
            .await?
            .ok_or_else(|| PortError::not_found("Invoice", &row.invoice_id))?;
        let currency: Currency = code
            .parse()
            .map_err(|_| DatabaseError::invalid_column("invoices.currency", &code))?;
        payment.check_amount(currency)?;

        InvoicePaymentRepository::insert(&mut tx, &row).await?;

        TransactionManager::commit(tx).await?;
        Ok(())
    }
}

impl DomainPort for PostgresInvoiceDao {}

#[async_trait]
impl HealthCheckable for PostgresInvoiceDao {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.tx_manager.pool())
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult::healthy(ADAPTER_ID, latency_ms),
            Err(e) => HealthCheckResult::unhealthy(ADAPTER_ID, latency_ms, format!("Database error: {}", e)),
        }
    }
}

#[async_trait]
impl InvoiceDao for PostgresInvoiceDao {
    #[instrument(skip(self))]
    async fn get_invoices(&self) -> Result<Vec<Invoice>, PortError> {
        let mut tx = self.tx_manager.begin_read().await?;

        let rows = InvoiceRepository::find_all(&mut tx).await?;
        let invoices = load_invoices(&mut tx, rows).await?;

        TransactionManager::commit(tx).await?;
        debug!(count = invoices.len(), "Loaded invoices");
        Ok(invoices)
    }

    #[instrument(skip(self))]
    async fn get_invoices_by_account(&self, account_id: &str) -> Result<Vec<Invoice>, PortError> {
        parse_key::<AccountId>(account_id, "account_id")?;
        let mut tx = self.tx_manager.begin_read().await?;

        let rows = InvoiceRepository::find_by_account(&mut tx, account_id).await?;
        let invoices = load_invoices(&mut tx, rows).await?;

        TransactionManager::commit(tx).await?;
        debug!(count = invoices.len(), "Loaded account invoices");
        Ok(invoices)
    }

    #[instrument(skip(self))]
    async fn get_invoice_items_by_account(&self, account_id: &str) -> Result<Vec<InvoiceItem>, PortError> {
        parse_key::<AccountId>(account_id, "account_id")?;
        let mut tx = self.tx_manager.begin_read().await?;

        let rows = InvoiceItemRepository::find_by_account(&mut tx, account_id).await?;
        TransactionManager::commit(tx).await?;

        let items = rows
            .into_iter()
            .map(|row| row.into_item())
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = items.len(), "Loaded account invoice items");
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn get_invoices_by_subscription(&self, subscription_id: &str) -> Result<Vec<Invoice>, PortError> {
        parse_key::<SubscriptionId>(subscription_id, "subscription_id")?;
        let mut tx = self.tx_manager.begin_read().await?;

        let rows = InvoiceRepository::find_by_subscription(&mut tx, subscription_id).await?;
        let invoices = load_invoices(&mut tx, rows).await?;

        TransactionManager::commit(tx).await?;
        debug!(count = invoices.len(), "Loaded subscription invoices");
        Ok(invoices)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, invoice_id: &str) -> Result<Option<Invoice>, PortError> {
        parse_key::<InvoiceId>(invoice_id, "invoice_id")?;
        let mut tx = self.tx_manager.begin_read().await?;

        let invoice = match InvoiceRepository::find_by_id(&mut tx, invoice_id).await? {
            Some(row) => load_invoices(&mut tx, vec![row]).await?.pop(),
            None => None,
        };

        TransactionManager::commit(tx).await?;
        Ok(invoice)
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id, account_id = %invoice.account_id))]
    async fn create(&self, invoice: &Invoice) -> Result<(), PortError> {
        invoice.validate()?;

        let row = InvoiceRow::from_invoice(invoice);
        let mut tx = self.tx_manager.begin_write().await?;

        if !InvoiceRepository::insert(&mut tx, &row).await? {
            info!("Invoice already stored, skipping creation");
            return Ok(());
        }

        let items: Vec<InvoiceItemRow> = invoice.items.iter().map(InvoiceItemRow::from_item).collect();
        InvoiceItemRepository::insert_all(&mut tx, &items).await?;

        let payments: Vec<InvoicePaymentRow> = invoice
            .payments
            .iter()
            .map(InvoicePaymentRow::from_payment)
            .collect();
        InvoicePaymentRepository::insert_all(&mut tx, &payments).await?;

        // Posted before commit so a failed post stores nothing. If the
        // commit then fails, subscribers have seen an invoice that was never
        // stored.
        let notification = InvoiceCreationNotification::from_invoice(invoice);
        self.event_bus
            .post(InvoiceEvent::InvoiceCreated(notification))
            .await?;

        TransactionManager::commit(tx).await?;
        info!(
            items = items.len(),
            payments = payments.len(),
            balance = %invoice.balance(),
            "Invoice created"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_invoices_for_payment(
        &self,
        target_date: NaiveDate,
        number_of_days: u32,
    ) -> Result<Vec<InvoiceId>, PortError> {
        let until = due_window_end(target_date, number_of_days);
        let mut tx = self.tx_manager.begin_read().await?;

        let keys = InvoiceRepository::find_due_for_payment(&mut tx, target_date, until).await?;
        TransactionManager::commit(tx).await?;

        let ids = keys
            .iter()
            .map(|key| {
                key.parse::<InvoiceId>()
                    .map_err(|_| DatabaseError::invalid_column("invoices.id", key))
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = ids.len(), "Found invoices due for payment");
        Ok(ids)
    }

    #[instrument(skip(self, amount))]
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
        self.append_payment(&payment).await?;

        info!(%amount, "Payment recorded");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn notify_failed_payment(
        &self,
        invoice_id: &str,
        payment_id: &str,
        payment_attempt_date: DateTime<Utc>,
    ) -> Result<(), PortError> {
        let invoice_id: InvoiceId = parse_key(invoice_id, "invoice_id")?;
        let payment_id: PaymentId = parse_key(payment_id, "payment_id")?;

        let payment = InvoicePayment::failed(invoice_id, payment_id, payment_attempt_date);
        self.append_payment(&payment).await?;

        warn!("Payment attempt failed");
        Ok(())
    }
}
