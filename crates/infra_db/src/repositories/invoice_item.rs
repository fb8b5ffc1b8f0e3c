//! Invoice item repository implementation

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgConnection;

use core_kernel::{Currency, InvoiceId, InvoiceItemId, SubscriptionId};
use domain_invoice::InvoiceItem;

use crate::error::DatabaseError;

/// Row of the `invoice_items` table
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct InvoiceItemRow {
    pub id: String,
    pub invoice_id: String,
    pub subscription_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub rate: Decimal,
    pub currency: String,
}

impl InvoiceItemRow {
    /// Flattens an item into a row
    pub fn from_item(item: &InvoiceItem) -> Self {
        Self {
            id: item.id.key(),
            invoice_id: item.invoice_id.key(),
            subscription_id: item.subscription_id.key(),
            start_date: item.start_date,
            end_date: item.end_date,
            description: item.description.clone(),
            amount: item.amount,
            rate: item.rate,
            currency: item.currency.code().to_string(),
        }
    }

    /// Rebuilds the domain item
    pub fn into_item(self) -> Result<InvoiceItem, DatabaseError> {
        let id: InvoiceItemId = self
            .id
            .parse()
            .map_err(|_| DatabaseError::invalid_column("invoice_items.id", &self.id))?;
        let invoice_id: InvoiceId = self
            .invoice_id
            .parse()
            .map_err(|_| DatabaseError::invalid_column("invoice_items.invoice_id", &self.invoice_id))?;
        let subscription_id: SubscriptionId = self.subscription_id.parse().map_err(|_| {
            DatabaseError::invalid_column("invoice_items.subscription_id", &self.subscription_id)
        })?;
        let currency: Currency = self
            .currency
            .parse()
            .map_err(|_| DatabaseError::invalid_column("invoice_items.currency", &self.currency))?;

        Ok(InvoiceItem {
            id,
            invoice_id,
            subscription_id,
            start_date: self.start_date,
            end_date: self.end_date,
            description: self.description,
            amount: self.amount,
            rate: self.rate,
            currency,
        })
    }
}

/// Repository for the `invoice_items` table
#[derive(Debug, Clone, Copy, Default)]
pub struct InvoiceItemRepository;

impl InvoiceItemRepository {
    /// Returns the items of the given invoices
    pub async fn find_by_invoices(
        conn: &mut PgConnection,
        invoice_ids: &[String],
    ) -> Result<Vec<InvoiceItemRow>, DatabaseError> {
        if invoice_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, InvoiceItemRow>(
            r#"
            SELECT id, invoice_id, subscription_id, start_date, end_date,
                   description, amount, rate, currency
            FROM invoice_items
            WHERE invoice_id = ANY($1)
            ORDER BY start_date, id
            "#,
        )
        .bind(invoice_ids)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// Returns every item on every invoice of an account
    pub async fn find_by_account(
        conn: &mut PgConnection,
        account_id: &str,
    ) -> Result<Vec<InvoiceItemRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, InvoiceItemRow>(
            r#"
            SELECT ii.id, ii.invoice_id, ii.subscription_id, ii.start_date, ii.end_date,
                   ii.description, ii.amount, ii.rate, ii.currency
            FROM invoice_items ii
            JOIN invoices i ON i.id = ii.invoice_id
            WHERE i.account_id = $1
            ORDER BY i.invoice_date, i.id, ii.start_date, ii.id
            "#,
        )
        .bind(account_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// Inserts a batch of items
    pub async fn insert_all(conn: &mut PgConnection, rows: &[InvoiceItemRow]) -> Result<(), DatabaseError> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    id, invoice_id, subscription_id, start_date, end_date,
                    description, amount, rate, currency
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(&row.id)
            .bind(&row.invoice_id)
            .bind(&row.subscription_id)
            .bind(row.start_date)
            .bind(row.end_date)
            .bind(&row.description)
            .bind(row.amount)
            .bind(row.rate)
            .bind(&row.currency)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}
