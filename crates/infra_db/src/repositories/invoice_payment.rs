//! Invoice payment repository implementation
//!
//! Payment history is append-only: rows are inserted, never updated.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use core_kernel::{Currency, InvoiceId, Money, PaymentId};
use domain_invoice::{InvoicePayment, PaymentOutcome};

use crate::error::DatabaseError;

/// Row of the `invoice_payments` table
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct InvoicePaymentRow {
    pub invoice_id: String,
    pub payment_id: String,
    pub payment_attempt_date: DateTime<Utc>,
    pub outcome: String,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
}

impl InvoicePaymentRow {
    /// Flattens a payment attempt into a row
    pub fn from_payment(payment: &InvoicePayment) -> Self {
        Self {
            invoice_id: payment.invoice_id.key(),
            payment_id: payment.payment_id.key(),
            payment_attempt_date: payment.payment_attempt_date,
            outcome: payment.outcome.as_str().to_string(),
            amount: payment.amount.map(|m| m.amount()),
            currency: payment.amount.map(|m| m.currency().code().to_string()),
        }
    }

    /// Rebuilds the domain payment
    pub fn into_payment(self) -> Result<InvoicePayment, DatabaseError> {
        let invoice_id: InvoiceId = self
            .invoice_id
            .parse()
            .map_err(|_| DatabaseError::invalid_column("invoice_payments.invoice_id", &self.invoice_id))?;
        let payment_id: PaymentId = self
            .payment_id
            .parse()
            .map_err(|_| DatabaseError::invalid_column("invoice_payments.payment_id", &self.payment_id))?;
        let outcome = PaymentOutcome::parse(&self.outcome)
            .ok_or_else(|| DatabaseError::invalid_column("invoice_payments.outcome", &self.outcome))?;

        let amount = match (self.amount, self.currency) {
            (Some(amount), Some(code)) => {
                let currency: Currency = code
                    .parse()
                    .map_err(|_| DatabaseError::invalid_column("invoice_payments.currency", &code))?;
                Some(Money::new(amount, currency))
            }
            _ => None,
        };

        Ok(InvoicePayment {
            invoice_id,
            payment_id,
            payment_attempt_date: self.payment_attempt_date,
            outcome,
            amount,
        })
    }
}

/// Repository for the `invoice_payments` table
#[derive(Debug, Clone, Copy, Default)]
pub struct InvoicePaymentRepository;

impl InvoicePaymentRepository {
    /// Returns the payment history of the given invoices, oldest first
    pub async fn find_by_invoices(
        conn: &mut PgConnection,
        invoice_ids: &[String],
    ) -> Result<Vec<InvoicePaymentRow>, DatabaseError> {
        if invoice_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, InvoicePaymentRow>(
            r#"
            SELECT invoice_id, payment_id, payment_attempt_date, outcome, amount, currency
            FROM invoice_payments
            WHERE invoice_id = ANY($1)
            ORDER BY payment_attempt_date, id
            "#,
        )
        .bind(invoice_ids)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// Appends one payment attempt
    pub async fn insert(conn: &mut PgConnection, row: &InvoicePaymentRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO invoice_payments (
                invoice_id, payment_id, payment_attempt_date, outcome, amount, currency
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&row.invoice_id)
        .bind(&row.payment_id)
        .bind(row.payment_attempt_date)
        .bind(&row.outcome)
        .bind(row.amount)
        .bind(&row.currency)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Appends a batch of payment attempts
    pub async fn insert_all(conn: &mut PgConnection, rows: &[InvoicePaymentRow]) -> Result<(), DatabaseError> {
        for row in rows {
            Self::insert(conn, row).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_successful_payment_row() {
        let payment = InvoicePayment::succeeded(
            InvoiceId::new(),
            PaymentId::new(),
            Money::new(dec!(12.50), Currency::GBP),
            Utc::now(),
        );

        let row = InvoicePaymentRow::from_payment(&payment);
        assert_eq!(row.outcome, "succeeded");
        assert_eq!(row.currency.as_deref(), Some("GBP"));
        assert_eq!(row.into_payment().unwrap(), payment);
    }

    #[test]
    fn test_failed_payment_row_has_no_amount() {
        let payment = InvoicePayment::failed(InvoiceId::new(), PaymentId::new(), Utc::now());

        let row = InvoicePaymentRow::from_payment(&payment);
        assert_eq!(row.outcome, "failed");
        assert!(row.amount.is_none());
        assert_eq!(row.into_payment().unwrap(), payment);
    }

    #[test]
    fn test_unknown_outcome_is_invalid_data() {
        let mut row = InvoicePaymentRow::from_payment(&InvoicePayment::failed(
            InvoiceId::new(),
            PaymentId::new(),
            Utc::now(),
        ));
        row.outcome = "pending".to_string();

        assert!(matches!(row.into_payment(), Err(DatabaseError::InvalidData(_))));
    }
}
