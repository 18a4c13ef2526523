//! Invoice and payment queries. Invoice generation and payment recording
//! are transactional and live in the lifecycle service.

use super::Database;
use crate::models::{Invoice, InvoiceFilter, InvoiceItem, InvoiceStatus, Payment};
use crate::services::metrics::DB_QUERY_DURATION;
use erp_core::error::AppError;
use erp_core::pagination::Page;
use chrono::NaiveDate;
use tracing::{info, instrument};
use uuid::Uuid;

pub(super) const INVOICE_COLUMNS: &str =
    "invoice_id, invoice_number, sales_order_id, customer_id, user_id, issue_date, due_date, \
     subtotal, tax_amount, discount_amount, total_amount, status, created_utc, updated_utc";

const ITEM_COLUMNS: &str =
    "item_id, invoice_id, product_id, description, quantity, unit_price, total_price";

const PAYMENT_COLUMNS: &str = "payment_id, invoice_id, amount, payment_date, payment_method, \
     reference, status, user_id, created_utc";

impl Database {
    /// Get an invoice by ID.
    #[instrument(skip(self))]
    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_id = $1"
        ))
        .bind(invoice_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    /// List the items of an invoice.
    #[instrument(skip(self))]
    pub async fn list_invoice_items(&self, invoice_id: Uuid) -> Result<Vec<InvoiceItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoice_items"])
            .start_timer();

        let items = sqlx::query_as::<_, InvoiceItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM invoice_items WHERE invoice_id = $1 ORDER BY item_id"
        ))
        .bind(invoice_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list items: {}", e)))?;

        timer.observe_duration();

        Ok(items)
    }

    /// List the payments recorded against an invoice.
    #[instrument(skip(self))]
    pub async fn list_payments(&self, invoice_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_payments"])
            .start_timer();

        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE invoice_id = $1 ORDER BY payment_date, created_utc"
        ))
        .bind(invoice_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list payments: {}", e)))?;

        timer.observe_duration();

        Ok(payments)
    }

    /// Count invoices matching a filter.
    #[instrument(skip(self, filter))]
    pub async fn count_invoices(&self, filter: &InvoiceFilter) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_invoices"])
            .start_timer();

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM invoices
            WHERE ($1::varchar IS NULL OR invoice_number ILIKE '%' || $1 || '%')
              AND ($2::uuid IS NULL OR customer_id = $2)
              AND ($3::varchar IS NULL OR status = $3)
              AND ($4::date IS NULL OR issue_date >= $4)
              AND ($5::date IS NULL OR issue_date <= $5)
            "#,
        )
        .bind(&filter.search)
        .bind(filter.customer_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count invoices: {}", e)))?;

        timer.observe_duration();

        Ok(count)
    }

    /// List invoices matching a filter, newest first.
    #[instrument(skip(self, filter, page))]
    pub async fn list_invoices(
        &self,
        filter: &InvoiceFilter,
        page: &Page,
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}
            FROM invoices
            WHERE ($1::varchar IS NULL OR invoice_number ILIKE '%' || $1 || '%')
              AND ($2::uuid IS NULL OR customer_id = $2)
              AND ($3::varchar IS NULL OR status = $3)
              AND ($4::date IS NULL OR issue_date >= $4)
              AND ($5::date IS NULL OR issue_date <= $5)
            ORDER BY issue_date DESC, invoice_number DESC
            LIMIT $6 OFFSET $7
            "#
        ))
        .bind(&filter.search)
        .bind(filter.customer_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(page.page_size)
        .bind(page.offset)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    /// Mark a draft invoice as sent.
    #[instrument(skip(self))]
    pub async fn mark_invoice_sent(&self, invoice_id: Uuid) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["mark_invoice_sent"])
            .start_timer();

        let current = self
            .get_invoice(invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

        if InvoiceStatus::parse(&current.status) != Some(InvoiceStatus::Draft) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "only draft invoices can be sent"
            )));
        }

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            UPDATE invoices SET status = 'sent', updated_utc = now()
            WHERE invoice_id = $1
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(invoice_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e)))?;

        timer.observe_duration();

        info!(invoice_id = %invoice_id, "Invoice sent");

        Ok(invoice)
    }

    /// Cancel an invoice. Blocked once payments exist.
    #[instrument(skip(self))]
    pub async fn cancel_invoice(&self, invoice_id: Uuid) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["cancel_invoice"])
            .start_timer();

        let current = self
            .get_invoice(invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

        match InvoiceStatus::parse(&current.status) {
            Some(InvoiceStatus::Draft) | Some(InvoiceStatus::Sent) | Some(InvoiceStatus::Overdue) => {}
            _ => {
                return Err(AppError::Conflict(anyhow::anyhow!(
                    "invoice in status '{}' cannot be cancelled",
                    current.status
                )))
            }
        }

        let payment_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM payments WHERE invoice_id = $1 AND status = 'completed'",
        )
        .bind(invoice_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count payments: {}", e)))?;

        if payment_count > 0 {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "invoice has completed payments"
            )));
        }

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            UPDATE invoices SET status = 'cancelled', updated_utc = now()
            WHERE invoice_id = $1
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(invoice_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e)))?;

        timer.observe_duration();

        info!(invoice_id = %invoice_id, "Invoice cancelled");

        Ok(invoice)
    }

    /// Sweep: mark sent and partial invoices past their due date overdue.
    /// Returns the number of invoices updated.
    #[instrument(skip(self))]
    pub async fn mark_invoices_overdue(&self, today: NaiveDate) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["mark_invoices_overdue"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET status = 'overdue', updated_utc = now()
            WHERE status IN ('sent', 'partial') AND due_date < $1
            "#,
        )
        .bind(today)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to mark overdue: {}", e)))?;

        timer.observe_duration();

        if result.rows_affected() > 0 {
            info!(count = result.rows_affected(), "Invoices marked overdue");
        }

        Ok(result.rows_affected())
    }

    /// Delete an invoice. Only draft or cancelled invoices without payments
    /// can be deleted; items cascade with the invoice.
    #[instrument(skip(self))]
    pub async fn delete_invoice(&self, invoice_id: Uuid) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_invoice"])
            .start_timer();

        let current = self
            .get_invoice(invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

        let status = InvoiceStatus::parse(&current.status);
        if !matches!(
            status,
            Some(InvoiceStatus::Draft) | Some(InvoiceStatus::Cancelled)
        ) {
            return Err(AppError::DeletionBlocked(anyhow::anyhow!(
                "invoice in status '{}' cannot be deleted",
                current.status
            )));
        }

        let payment_count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM payments WHERE invoice_id = $1")
                .bind(invoice_id)
                .fetch_one(self.pool())
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to count payments: {}", e))
                })?;

        if payment_count > 0 {
            return Err(AppError::DeletionBlocked(anyhow::anyhow!(
                "invoice has {} payment(s)",
                payment_count
            )));
        }

        sqlx::query("DELETE FROM invoices WHERE invoice_id = $1")
            .bind(invoice_id)
            .execute(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete invoice: {}", e))
            })?;

        timer.observe_duration();

        info!(invoice_id = %invoice_id, "Invoice deleted");

        Ok(())
    }
}
