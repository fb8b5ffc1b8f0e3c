//! Invoice repository implementation
//!
//! Database access for the `invoices` table. Functions take a connection
//! rather than the pool so the adapter can run several of them inside one
//! transaction.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgConnection;

use core_kernel::{AccountId, Currency, InvoiceId};
use domain_invoice::Invoice;

use crate::error::DatabaseError;

/// Row of the `invoices` table
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct InvoiceRow {
    pub id: String,
    pub account_id: String,
    pub invoice_date: DateTime<Utc>,
    pub target_date: NaiveDate,
    pub currency: String,
}

impl InvoiceRow {
    /// Flattens the header of an invoice into a row
    pub fn from_invoice(invoice: &Invoice) -> Self {
        Self {
            id: invoice.id.key(),
            account_id: invoice.account_id.key(),
            invoice_date: invoice.invoice_date,
            target_date: invoice.target_date,
            currency: invoice.currency.code().to_string(),
        }
    }

    /// Rebuilds an invoice without items or payments
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidData` if a key or the currency code
    /// does not parse.
    pub fn into_invoice(self) -> Result<Invoice, DatabaseError> {
        let id: InvoiceId = self
            .id
            .parse()
            .map_err(|_| DatabaseError::invalid_column("invoices.id", &self.id))?;
        let account_id: AccountId = self
            .account_id
            .parse()
            .map_err(|_| DatabaseError::invalid_column("invoices.account_id", &self.account_id))?;
        let currency: Currency = self
            .currency
            .parse()
            .map_err(|_| DatabaseError::invalid_column("invoices.currency", &self.currency))?;

        Ok(Invoice::with_id(
            id,
            account_id,
            self.invoice_date,
            self.target_date,
            currency,
        ))
    }
}

const SELECT_INVOICE: &str = r#"
    SELECT id, account_id, invoice_date, target_date, currency
    FROM invoices
"#;

/// Repository for the `invoices` table
#[derive(Debug, Clone, Copy, Default)]
pub struct InvoiceRepository;

impl InvoiceRepository {
    /// Returns every invoice ordered by invoice date
    pub async fn find_all(conn: &mut PgConnection) -> Result<Vec<InvoiceRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "{} ORDER BY invoice_date, id",
            SELECT_INVOICE
        ))
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// Returns one invoice, if present
    pub async fn find_by_id(
        conn: &mut PgConnection,
        invoice_id: &str,
    ) -> Result<Option<InvoiceRow>, DatabaseError> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!("{} WHERE id = $1", SELECT_INVOICE))
            .bind(invoice_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row)
    }

    /// Returns the invoices of an account ordered by invoice date
    pub async fn find_by_account(
        conn: &mut PgConnection,
        account_id: &str,
    ) -> Result<Vec<InvoiceRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "{} WHERE account_id = $1 ORDER BY invoice_date, id",
            SELECT_INVOICE
        ))
        .bind(account_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// Returns the invoices holding at least one item for a subscription
    pub async fn find_by_subscription(
        conn: &mut PgConnection,
        subscription_id: &str,
    ) -> Result<Vec<InvoiceRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"{}
            WHERE id IN (SELECT invoice_id FROM invoice_items WHERE subscription_id = $1)
            ORDER BY invoice_date, id"#,
            SELECT_INVOICE
        ))
        .bind(subscription_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// Returns the currency code of a stored invoice
    pub async fn find_currency(
        conn: &mut PgConnection,
        invoice_id: &str,
    ) -> Result<Option<String>, DatabaseError> {
        let currency = sqlx::query_scalar::<_, String>("SELECT currency FROM invoices WHERE id = $1")
            .bind(invoice_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(currency)
    }

    /// Inserts an invoice header unless the id is already taken
    ///
    /// Returns false when a row with the same id exists. A concurrent insert
    /// of the same id waits for the other transaction and then reports
    /// false once it commits.
    pub async fn insert(conn: &mut PgConnection, row: &InvoiceRow) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            INSERT INTO invoices (id, account_id, invoice_date, target_date, currency)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&row.id)
        .bind(&row.account_id)
        .bind(row.invoice_date)
        .bind(row.target_date)
        .bind(&row.currency)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Returns ids of invoices with a positive balance whose target date lies
    /// within `[from, until]`
    ///
    /// The balance is the item total minus succeeded payments, both computed
    /// in the query.
    pub async fn find_due_for_payment(
        conn: &mut PgConnection,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<String>, DatabaseError> {
        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT i.id
            FROM invoices i
            WHERE i.target_date BETWEEN $1 AND $2
              AND COALESCE(
                    (SELECT SUM(ii.amount) FROM invoice_items ii WHERE ii.invoice_id = i.id), 0)
                - COALESCE(
                    (SELECT SUM(ip.amount) FROM invoice_payments ip
                     WHERE ip.invoice_id = i.id AND ip.outcome = 'succeeded'), 0)
                > 0
            ORDER BY i.target_date, i.id
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_all(&mut *conn)
        .await?;

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_row_round_trips_header() {
        let invoice = Invoice::new(
            AccountId::new(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            Currency::EUR,
        );

        let row = InvoiceRow::from_invoice(&invoice);
        assert_eq!(row.currency, "EUR");
        assert_eq!(row.id.len(), 36);

        let restored = row.into_invoice().unwrap();
        assert_eq!(restored, invoice);
    }

    #[test]
    fn test_row_with_bad_currency_is_invalid_data() {
        let row = InvoiceRow {
            id: InvoiceId::new().key(),
            account_id: AccountId::new().key(),
            invoice_date: Utc::now(),
            target_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            currency: "XXX".to_string(),
        };

        assert!(matches!(row.into_invoice(), Err(DatabaseError::InvalidData(_))));
    }
}
