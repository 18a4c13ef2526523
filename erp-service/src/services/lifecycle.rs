//! Order lifecycle and stock consistency.
//!
//! Every operation here couples a status change with its stock and
//! financial consequences inside a single transaction: the transition
//! commits entirely or not at all. Stock decrements use a conditional
//! UPDATE guarded on the current quantity, so the availability check and
//! the write are one atomic statement; concurrent transitions on the same
//! order are serialized by a row lock on the order itself.

use crate::models::{
    CreatePayment, GenerateInvoice, Invoice, InvoiceStatus, MovementRef, MovementType, Payment,
    Product, PurchaseOrder, PurchaseOrderStatus, SalesOrder, SalesOrderStatus, StockAdjustment,
    StockEffect,
};
use crate::services::database::Database;
use crate::services::metrics::{DB_QUERY_DURATION, ORDER_TRANSITIONS_TOTAL, STOCK_MOVEMENTS_TOTAL};
use erp_core::context::RequestContext;
use erp_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use tracing::{info, instrument};
use uuid::Uuid;

const SALES_ORDER_COLUMNS: &str =
    "sales_order_id, order_number, customer_id, user_id, order_date, status, subtotal, \
     tax_amount, discount_amount, total_amount, notes, created_utc, updated_utc";

const PURCHASE_ORDER_COLUMNS: &str =
    "purchase_order_id, order_number, supplier_id, user_id, order_date, status, subtotal, \
     tax_amount, discount_amount, total_amount, notes, created_utc, updated_utc";

const INVOICE_COLUMNS: &str =
    "invoice_id, invoice_number, sales_order_id, customer_id, user_id, issue_date, due_date, \
     subtotal, tax_amount, discount_amount, total_amount, status, created_utc, updated_utc";

const PRODUCT_COLUMNS: &str =
    "product_id, sku, name, description, category_id, stock_quantity, min_stock_level, \
     max_stock_level, cost_price, unit_price, status, created_utc, updated_utc";

/// Order lifecycle engine.
#[derive(Clone)]
pub struct Lifecycle {
    db: Database,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLine {
    product_id: Uuid,
    quantity: i32,
}

impl Lifecycle {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // -------------------------------------------------------------------------
    // Sales Orders
    // -------------------------------------------------------------------------

    /// Transition a sales order to a new status, applying the stock effect.
    ///
    /// Submitting the current status again is a no-op and returns the order
    /// unchanged, so a duplicated form submission cannot move stock twice.
    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn update_sales_order_status(
        &self,
        ctx: &RequestContext,
        sales_order_id: Uuid,
        new_status: SalesOrderStatus,
    ) -> Result<SalesOrder, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_sales_order_status"])
            .start_timer();

        let mut tx = self.db.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        // Lock the order row so concurrent transitions serialize.
        let order = sqlx::query_as::<_, SalesOrder>(&format!(
            "SELECT {SALES_ORDER_COLUMNS} FROM sales_orders WHERE sales_order_id = $1 FOR UPDATE"
        ))
        .bind(sales_order_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load order: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Sales order not found")))?;

        let current = SalesOrderStatus::parse(&order.status).ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("corrupt order status: {}", order.status))
        })?;

        if current == new_status {
            tx.rollback().await.ok();
            return Ok(order);
        }

        if !current.can_transition_to(new_status) {
            tx.rollback().await.ok();
            return Err(AppError::Conflict(anyhow::anyhow!(
                "cannot transition order from '{}' to '{}'",
                current.as_str(),
                new_status.as_str()
            )));
        }

        let lines = sqlx::query_as::<_, OrderLine>(
            "SELECT product_id, quantity FROM sales_order_items WHERE sales_order_id = $1",
        )
        .bind(sales_order_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load items: {}", e)))?;

        match current.stock_effect(new_status) {
            StockEffect::Commit => {
                for line in &lines {
                    let result = sqlx::query(
                        r#"
                        UPDATE products
                        SET stock_quantity = stock_quantity - $1, updated_utc = now()
                        WHERE product_id = $2 AND stock_quantity >= $1
                        "#,
                    )
                    .bind(line.quantity)
                    .bind(line.product_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(anyhow::anyhow!("Failed to decrement stock: {}", e))
                    })?;

                    if result.rows_affected() == 0 {
                        tx.rollback().await.ok();
                        return Err(AppError::InsufficientStock(anyhow::anyhow!(
                            "insufficient stock for product {}",
                            line.product_id
                        )));
                    }

                    insert_movement(
                        &mut tx,
                        line.product_id,
                        MovementType::Out,
                        line.quantity,
                        MovementRef::Sale,
                        Some(sales_order_id),
                        ctx.user_id,
                    )
                    .await?;
                }
            }
            StockEffect::Restore => {
                for line in &lines {
                    sqlx::query(
                        r#"
                        UPDATE products
                        SET stock_quantity = stock_quantity + $1, updated_utc = now()
                        WHERE product_id = $2
                        "#,
                    )
                    .bind(line.quantity)
                    .bind(line.product_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(anyhow::anyhow!("Failed to restore stock: {}", e))
                    })?;

                    insert_movement(
                        &mut tx,
                        line.product_id,
                        MovementType::In,
                        line.quantity,
                        MovementRef::Return,
                        Some(sales_order_id),
                        ctx.user_id,
                    )
                    .await?;
                }
            }
            StockEffect::None => {}
        }

        let updated = sqlx::query_as::<_, SalesOrder>(&format!(
            r#"
            UPDATE sales_orders SET status = $2, updated_utc = now()
            WHERE sales_order_id = $1
            RETURNING {SALES_ORDER_COLUMNS}
            "#
        ))
        .bind(sales_order_id)
        .bind(new_status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update status: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        ORDER_TRANSITIONS_TOTAL
            .with_label_values(&["sales", new_status.as_str()])
            .inc();

        info!(
            sales_order_id = %sales_order_id,
            from = current.as_str(),
            to = new_status.as_str(),
            "Sales order status updated"
        );

        Ok(updated)
    }

    // -------------------------------------------------------------------------
    // Purchase Orders
    // -------------------------------------------------------------------------

    /// Transition a purchase order to a new status. Stock is received on
    /// the first entry into `received` only; `received` is terminal and a
    /// repeated submission is a no-op.
    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn update_purchase_order_status(
        &self,
        ctx: &RequestContext,
        purchase_order_id: Uuid,
        new_status: PurchaseOrderStatus,
    ) -> Result<PurchaseOrder, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_purchase_order_status"])
            .start_timer();

        let mut tx = self.db.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let order = sqlx::query_as::<_, PurchaseOrder>(&format!(
            "SELECT {PURCHASE_ORDER_COLUMNS} FROM purchase_orders WHERE purchase_order_id = $1 FOR UPDATE"
        ))
        .bind(purchase_order_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load order: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Purchase order not found")))?;

        let current = PurchaseOrderStatus::parse(&order.status).ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("corrupt order status: {}", order.status))
        })?;

        if current == new_status {
            tx.rollback().await.ok();
            return Ok(order);
        }

        if !current.can_transition_to(new_status) {
            tx.rollback().await.ok();
            return Err(AppError::Conflict(anyhow::anyhow!(
                "cannot transition order from '{}' to '{}'",
                current.as_str(),
                new_status.as_str()
            )));
        }

        if current.receives_stock(new_status) {
            let lines = sqlx::query_as::<_, OrderLine>(
                "SELECT product_id, quantity FROM purchase_order_items WHERE purchase_order_id = $1",
            )
            .bind(purchase_order_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load items: {}", e)))?;

            for line in &lines {
                sqlx::query(
                    r#"
                    UPDATE products
                    SET stock_quantity = stock_quantity + $1, updated_utc = now()
                    WHERE product_id = $2
                    "#,
                )
                .bind(line.quantity)
                .bind(line.product_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to receive stock: {}", e))
                })?;

                insert_movement(
                    &mut tx,
                    line.product_id,
                    MovementType::In,
                    line.quantity,
                    MovementRef::Purchase,
                    Some(purchase_order_id),
                    ctx.user_id,
                )
                .await?;
            }
        }

        let updated = sqlx::query_as::<_, PurchaseOrder>(&format!(
            r#"
            UPDATE purchase_orders SET status = $2, updated_utc = now()
            WHERE purchase_order_id = $1
            RETURNING {PURCHASE_ORDER_COLUMNS}
            "#
        ))
        .bind(purchase_order_id)
        .bind(new_status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update status: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        ORDER_TRANSITIONS_TOTAL
            .with_label_values(&["purchase", new_status.as_str()])
            .inc();

        info!(
            purchase_order_id = %purchase_order_id,
            from = current.as_str(),
            to = new_status.as_str(),
            "Purchase order status updated"
        );

        Ok(updated)
    }

    // -------------------------------------------------------------------------
    // Stock Adjustments
    // -------------------------------------------------------------------------

    /// Apply a signed manual stock adjustment. The result may never go
    /// below zero; the movement row records the direction.
    #[instrument(skip(self, ctx, input), fields(user_id = %ctx.user_id, product_id = %input.product_id))]
    pub async fn adjust_stock(
        &self,
        ctx: &RequestContext,
        input: &StockAdjustment,
    ) -> Result<Product, AppError> {
        if input.delta == 0 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "adjustment delta cannot be zero"
            )));
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["adjust_stock"])
            .start_timer();

        let mut tx = self.db.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let quantity = input.delta.abs();
        let product = if input.delta > 0 {
            sqlx::query_as::<_, Product>(&format!(
                r#"
                UPDATE products
                SET stock_quantity = stock_quantity + $1, updated_utc = now()
                WHERE product_id = $2
                RETURNING {PRODUCT_COLUMNS}
                "#
            ))
            .bind(quantity)
            .bind(input.product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to adjust stock: {}", e))
            })?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?
        } else {
            let updated = sqlx::query_as::<_, Product>(&format!(
                r#"
                UPDATE products
                SET stock_quantity = stock_quantity - $1, updated_utc = now()
                WHERE product_id = $2 AND stock_quantity >= $1
                RETURNING {PRODUCT_COLUMNS}
                "#
            ))
            .bind(quantity)
            .bind(input.product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to adjust stock: {}", e))
            })?;

            match updated {
                Some(product) => product,
                None => {
                    // Distinguish a missing product from insufficient stock.
                    let exists = sqlx::query_scalar::<_, i64>(
                        "SELECT COUNT(*) FROM products WHERE product_id = $1",
                    )
                    .bind(input.product_id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(anyhow::anyhow!("Failed to check product: {}", e))
                    })?;

                    tx.rollback().await.ok();
                    return if exists == 0 {
                        Err(AppError::NotFound(anyhow::anyhow!("Product not found")))
                    } else {
                        Err(AppError::InsufficientStock(anyhow::anyhow!(
                            "adjustment would make stock negative"
                        )))
                    };
                }
            }
        };

        let direction = if input.delta > 0 {
            MovementType::In
        } else {
            MovementType::Out
        };
        insert_movement_with_note(
            &mut tx,
            input.product_id,
            direction,
            quantity,
            MovementRef::Adjustment,
            None,
            ctx.user_id,
            input.note.as_deref(),
        )
        .await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            product_id = %input.product_id,
            delta = input.delta,
            stock_quantity = product.stock_quantity,
            "Stock adjusted"
        );

        Ok(product)
    }

    // -------------------------------------------------------------------------
    // Invoices
    // -------------------------------------------------------------------------

    /// Generate an invoice from a committed sales order. The order's totals
    /// and items are copied verbatim; at most one invoice may exist per
    /// order.
    #[instrument(skip(self, ctx, input), fields(user_id = %ctx.user_id, sales_order_id = %input.sales_order_id))]
    pub async fn generate_invoice(
        &self,
        ctx: &RequestContext,
        input: &GenerateInvoice,
    ) -> Result<Invoice, AppError> {
        match self.try_generate_invoice(ctx, input).await {
            // Invoice number collision with a concurrent generation; the
            // retry re-checks the one-invoice-per-order rule first.
            Err(AppError::Conflict(e))
                if e.to_string().contains("Invoice number collision") =>
            {
                self.try_generate_invoice(ctx, input).await
            }
            other => other,
        }
    }

    async fn try_generate_invoice(
        &self,
        ctx: &RequestContext,
        input: &GenerateInvoice,
    ) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["generate_invoice"])
            .start_timer();

        let mut tx = self.db.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let order = sqlx::query_as::<_, SalesOrder>(&format!(
            "SELECT {SALES_ORDER_COLUMNS} FROM sales_orders WHERE sales_order_id = $1 FOR UPDATE"
        ))
        .bind(input.sales_order_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load order: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Sales order not found")))?;

        let status = SalesOrderStatus::parse(&order.status);
        if !matches!(
            status,
            Some(SalesOrderStatus::Confirmed)
                | Some(SalesOrderStatus::Shipped)
                | Some(SalesOrderStatus::Delivered)
        ) {
            tx.rollback().await.ok();
            return Err(AppError::Conflict(anyhow::anyhow!(
                "order in status '{}' cannot be invoiced",
                order.status
            )));
        }

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM invoices WHERE sales_order_id = $1",
        )
        .bind(input.sales_order_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to check invoices: {}", e)))?;

        if existing > 0 {
            tx.rollback().await.ok();
            return Err(AppError::Conflict(anyhow::anyhow!(
                "an invoice already exists for order {}",
                order.order_number
            )));
        }

        let issue_date = chrono::Utc::now().date_naive();
        let month_prefix = format!("INV-{}", issue_date.format("%Y%m"));
        let seq = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) + 1 FROM invoices WHERE invoice_number LIKE $1 || '-%'",
        )
        .bind(&month_prefix)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to generate invoice number: {}", e))
        })?;
        let invoice_number = format!("{}-{:04}", month_prefix, seq);

        let invoice_id = Uuid::new_v4();
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            INSERT INTO invoices (
                invoice_id, invoice_number, sales_order_id, customer_id, user_id,
                issue_date, due_date, subtotal, tax_amount, discount_amount, total_amount
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(invoice_id)
        .bind(&invoice_number)
        .bind(input.sales_order_id)
        .bind(order.customer_id)
        .bind(ctx.user_id)
        .bind(issue_date)
        .bind(input.due_date)
        .bind(order.subtotal)
        .bind(order.tax_amount)
        .bind(order.discount_amount)
        .bind(order.total_amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Invoice number collision"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e)),
        })?;

        // Copy order items verbatim; the invoice lines are independent of
        // the order from here on.
        sqlx::query(
            r#"
            INSERT INTO invoice_items (item_id, invoice_id, product_id, description, quantity, unit_price, total_price)
            SELECT gen_random_uuid(), $1, i.product_id, p.name, i.quantity, i.unit_price, i.total_price
            FROM sales_order_items i
            JOIN products p ON p.product_id = i.product_id
            WHERE i.sales_order_id = $2
            "#,
        )
        .bind(invoice_id)
        .bind(input.sales_order_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to copy items: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            invoice_id = %invoice.invoice_id,
            invoice_number = %invoice.invoice_number,
            sales_order_id = %input.sales_order_id,
            "Invoice generated"
        );

        Ok(invoice)
    }

    // -------------------------------------------------------------------------
    // Payments
    // -------------------------------------------------------------------------

    /// Record a payment and recompute the invoice status from the sum of
    /// completed payments, atomically with the insert.
    #[instrument(skip(self, ctx, input), fields(user_id = %ctx.user_id, invoice_id = %invoice_id))]
    pub async fn record_payment(
        &self,
        ctx: &RequestContext,
        invoice_id: Uuid,
        input: &CreatePayment,
    ) -> Result<(Payment, Invoice), AppError> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "payment amount must be positive"
            )));
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["record_payment"])
            .start_timer();

        let mut tx = self.db.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_id = $1 FOR UPDATE"
        ))
        .bind(invoice_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load invoice: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

        let current_status = InvoiceStatus::parse(&invoice.status).ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("corrupt invoice status: {}", invoice.status))
        })?;

        if current_status == InvoiceStatus::Cancelled {
            tx.rollback().await.ok();
            return Err(AppError::Conflict(anyhow::anyhow!(
                "cannot record a payment against a cancelled invoice"
            )));
        }

        let status = input.status.unwrap_or(crate::models::PaymentStatus::Completed);
        let payment_id = Uuid::new_v4();
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (payment_id, invoice_id, amount, payment_date, payment_method, reference, status, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING payment_id, invoice_id, amount, payment_date, payment_method, reference, status, user_id, created_utc
            "#,
        )
        .bind(payment_id)
        .bind(invoice_id)
        .bind(input.amount)
        .bind(input.payment_date)
        .bind(&input.payment_method)
        .bind(&input.reference)
        .bind(status.as_str())
        .bind(ctx.user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert payment: {}", e)))?;

        let completed_sum = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE invoice_id = $1 AND status = 'completed'",
        )
        .bind(invoice_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to sum payments: {}", e)))?;

        let new_status = current_status.after_payment(invoice.total_amount, completed_sum);
        let invoice = if new_status != current_status {
            sqlx::query_as::<_, Invoice>(&format!(
                r#"
                UPDATE invoices SET status = $2, updated_utc = now()
                WHERE invoice_id = $1
                RETURNING {INVOICE_COLUMNS}
                "#
            ))
            .bind(invoice_id)
            .bind(new_status.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e))
            })?
        } else {
            invoice
        };

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            payment_id = %payment.payment_id,
            invoice_id = %invoice_id,
            amount = %payment.amount,
            status = %invoice.status,
            "Payment recorded"
        );

        Ok((payment, invoice))
    }
}

/// Append one movement row inside the caller's transaction.
async fn insert_movement(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    movement_type: MovementType,
    quantity: i32,
    reference_type: MovementRef,
    reference_id: Option<Uuid>,
    user_id: Uuid,
) -> Result<(), AppError> {
    insert_movement_with_note(
        tx,
        product_id,
        movement_type,
        quantity,
        reference_type,
        reference_id,
        user_id,
        None,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn insert_movement_with_note(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    movement_type: MovementType,
    quantity: i32,
    reference_type: MovementRef,
    reference_id: Option<Uuid>,
    user_id: Uuid,
    note: Option<&str>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (movement_id, product_id, movement_type, quantity, reference_type, reference_id, note, user_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(product_id)
    .bind(movement_type.as_str())
    .bind(quantity)
    .bind(reference_type.as_str())
    .bind(reference_id)
    .bind(note)
    .bind(user_id)
    .execute(&mut **tx)
    .await
    .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert movement: {}", e)))?;

    STOCK_MOVEMENTS_TOTAL
        .with_label_values(&[movement_type.as_str()])
        .inc();

    Ok(())
}
