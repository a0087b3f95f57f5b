//! Invoice mirror: best-effort copy of purchases into the invoice tables
//!
//! The purchase store stays authoritative. A mirror implementation only has
//! to write one invoice header plus one line per purchase item, and to drop
//! that invoice again when the purchase is deleted.

use axum::async_trait;
use shared::models::MirroredInvoice;
use sqlx::PgPool;
use tracing::debug;

use crate::error::AppResult;

/// Destination for mirrored purchase invoices
#[async_trait]
pub trait InvoiceMirror: Send + Sync {
    /// Short name used in logs and responses
    fn backend_tag(&self) -> &'static str;

    /// Whether writes actually go anywhere
    fn enabled(&self) -> bool {
        true
    }

    /// Write the invoice and its lines. Mirroring the same purchase twice
    /// must not create a second invoice.
    async fn mirror(&self, invoice: &MirroredInvoice) -> AppResult<()>;

    /// Remove the invoice mirrored from `source_purchase_id`, if any
    async fn remove(&self, source_purchase_id: i64) -> AppResult<()>;
}

/// Mirror into the `invoices` / `invoice_items` tables of the clinic database
#[derive(Clone)]
pub struct PgInvoiceMirror {
    db: PgPool,
}

impl PgInvoiceMirror {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InvoiceMirror for PgInvoiceMirror {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn mirror(&self, mirrored: &MirroredInvoice) -> AppResult<()> {
        let invoice = &mirrored.invoice;
        let mut tx = self.db.begin().await?;

        let invoice_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO invoices (
                invoice_number, supplier_name, invoice_date, invoice_type, status,
                subtotal, tax_amount, total_amount, source_purchase_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (source_purchase_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&invoice.invoice_number)
        .bind(&invoice.supplier_name)
        .bind(invoice.invoice_date)
        .bind(&invoice.invoice_type)
        .bind(&invoice.status)
        .bind(invoice.subtotal)
        .bind(invoice.tax_amount)
        .bind(invoice.total_amount)
        .bind(invoice.source_purchase_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(invoice_id) = invoice_id else {
            debug!(
                purchase_id = invoice.source_purchase_id,
                "Invoice already mirrored, nothing to do"
            );
            tx.rollback().await?;
            return Ok(());
        };

        for line in &mirrored.lines {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    invoice_id, product_id, description, quantity, unit_price, line_total, notes
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(invoice_id)
            .bind(line.product_id)
            .bind(&line.description)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.line_total)
            .bind(&line.notes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn remove(&self, source_purchase_id: i64) -> AppResult<()> {
        // invoice_items cascade with their invoice
        sqlx::query("DELETE FROM invoices WHERE source_purchase_id = $1")
            .bind(source_purchase_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Mirror that drops everything; used when no invoice store is configured
#[derive(Clone, Copy, Default)]
pub struct DisabledInvoiceMirror;

#[async_trait]
impl InvoiceMirror for DisabledInvoiceMirror {
    fn backend_tag(&self) -> &'static str {
        "disabled"
    }

    fn enabled(&self) -> bool {
        false
    }

    async fn mirror(&self, _invoice: &MirroredInvoice) -> AppResult<()> {
        Ok(())
    }

    async fn remove(&self, _source_purchase_id: i64) -> AppResult<()> {
        Ok(())
    }
}
