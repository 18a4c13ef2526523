//! Sales order repository.
//!
//! Creation is transactional: the order number is generated, the header and
//! all items are inserted, and the totals are computed inside one
//! transaction. Status transitions live in the lifecycle service.

use super::Database;
use crate::models::{
    CreateSalesOrder, SalesOrder, SalesOrderFilter, SalesOrderItem, SalesOrderStatus,
    UpdateSalesOrder,
};
use crate::services::metrics::DB_QUERY_DURATION;
use erp_core::error::AppError;
use erp_core::pagination::Page;
use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "sales_order_id, order_number, customer_id, user_id, order_date, \
     status, subtotal, tax_amount, discount_amount, total_amount, notes, created_utc, updated_utc";

const ITEM_COLUMNS: &str = "item_id, sales_order_id, product_id, quantity, unit_price, total_price";

impl Database {
    /// Create a new sales order with its items.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub async fn create_sales_order(
        &self,
        created_by: Uuid,
        input: &CreateSalesOrder,
    ) -> Result<SalesOrder, AppError> {
        // One retry if the generated order number collides with a
        // concurrent insert.
        match self.try_create_sales_order(created_by, input).await {
            Err(AppError::Conflict(_)) => self.try_create_sales_order(created_by, input).await,
            other => other,
        }
    }

    async fn try_create_sales_order(
        &self,
        created_by: Uuid,
        input: &CreateSalesOrder,
    ) -> Result<SalesOrder, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_sales_order"])
            .start_timer();

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let seq = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) + 1 FROM sales_orders")
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to generate order number: {}", e))
            })?;
        let order_number = format!("SO-{:05}", seq);

        let subtotal: Decimal = input
            .items
            .iter()
            .map(|item| Decimal::from(item.quantity) * item.unit_price)
            .sum();
        let tax_amount = input.tax_amount.unwrap_or(Decimal::ZERO);
        let discount_amount = input.discount_amount.unwrap_or(Decimal::ZERO);
        let total_amount = subtotal + tax_amount - discount_amount;

        let sales_order_id = Uuid::new_v4();
        let order = sqlx::query_as::<_, SalesOrder>(&format!(
            r#"
            INSERT INTO sales_orders (
                sales_order_id, order_number, customer_id, user_id, order_date,
                subtotal, tax_amount, discount_amount, total_amount, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(sales_order_id)
        .bind(&order_number)
        .bind(input.customer_id)
        .bind(created_by)
        .bind(input.order_date)
        .bind(subtotal)
        .bind(tax_amount)
        .bind(discount_amount)
        .bind(total_amount)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Order number collision"))
            }
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::BadRequest(anyhow::anyhow!("Unknown customer"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create order: {}", e)),
        })?;

        for item in &input.items {
            let total_price = Decimal::from(item.quantity) * item.unit_price;
            sqlx::query(
                r#"
                INSERT INTO sales_order_items (item_id, sales_order_id, product_id, quantity, unit_price, total_price)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(sales_order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(total_price)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    AppError::BadRequest(anyhow::anyhow!("Unknown product on order item"))
                }
                _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert item: {}", e)),
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            sales_order_id = %order.sales_order_id,
            order_number = %order.order_number,
            item_count = input.items.len(),
            "Sales order created"
        );

        Ok(order)
    }

    /// Get a sales order by ID.
    #[instrument(skip(self))]
    pub async fn get_sales_order(
        &self,
        sales_order_id: Uuid,
    ) -> Result<Option<SalesOrder>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_sales_order"])
            .start_timer();

        let order = sqlx::query_as::<_, SalesOrder>(&format!(
            "SELECT {ORDER_COLUMNS} FROM sales_orders WHERE sales_order_id = $1"
        ))
        .bind(sales_order_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get order: {}", e)))?;

        timer.observe_duration();

        Ok(order)
    }

    /// List the items of a sales order.
    #[instrument(skip(self))]
    pub async fn list_sales_order_items(
        &self,
        sales_order_id: Uuid,
    ) -> Result<Vec<SalesOrderItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_sales_order_items"])
            .start_timer();

        let items = sqlx::query_as::<_, SalesOrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sales_order_items WHERE sales_order_id = $1 ORDER BY item_id"
        ))
        .bind(sales_order_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list items: {}", e)))?;

        timer.observe_duration();

        Ok(items)
    }

    /// Count sales orders matching a filter.
    #[instrument(skip(self, filter))]
    pub async fn count_sales_orders(&self, filter: &SalesOrderFilter) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_sales_orders"])
            .start_timer();

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM sales_orders
            WHERE ($1::varchar IS NULL OR order_number ILIKE '%' || $1 || '%')
              AND ($2::uuid IS NULL OR customer_id = $2)
              AND ($3::varchar IS NULL OR status = $3)
              AND ($4::date IS NULL OR order_date >= $4)
              AND ($5::date IS NULL OR order_date <= $5)
            "#,
        )
        .bind(&filter.search)
        .bind(filter.customer_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count orders: {}", e)))?;

        timer.observe_duration();

        Ok(count)
    }

    /// List sales orders matching a filter, newest first.
    #[instrument(skip(self, filter, page))]
    pub async fn list_sales_orders(
        &self,
        filter: &SalesOrderFilter,
        page: &Page,
    ) -> Result<Vec<SalesOrder>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_sales_orders"])
            .start_timer();

        let orders = sqlx::query_as::<_, SalesOrder>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM sales_orders
            WHERE ($1::varchar IS NULL OR order_number ILIKE '%' || $1 || '%')
              AND ($2::uuid IS NULL OR customer_id = $2)
              AND ($3::varchar IS NULL OR status = $3)
              AND ($4::date IS NULL OR order_date >= $4)
              AND ($5::date IS NULL OR order_date <= $5)
            ORDER BY order_date DESC, order_number DESC
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
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list orders: {}", e)))?;

        timer.observe_duration();

        Ok(orders)
    }

    /// Update a pending sales order's header fields.
    #[instrument(skip(self, input))]
    pub async fn update_sales_order(
        &self,
        sales_order_id: Uuid,
        input: &UpdateSalesOrder,
    ) -> Result<SalesOrder, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_sales_order"])
            .start_timer();

        let current = self
            .get_sales_order(sales_order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Sales order not found")))?;

        if SalesOrderStatus::parse(&current.status) != Some(SalesOrderStatus::Pending) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "only pending orders can be edited"
            )));
        }

        let order = sqlx::query_as::<_, SalesOrder>(&format!(
            r#"
            UPDATE sales_orders
            SET order_date = COALESCE($2, order_date),
                tax_amount = COALESCE($3, tax_amount),
                discount_amount = COALESCE($4, discount_amount),
                notes = COALESCE($5, notes),
                total_amount = subtotal + COALESCE($3, tax_amount) - COALESCE($4, discount_amount),
                updated_utc = now()
            WHERE sales_order_id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(sales_order_id)
        .bind(input.order_date)
        .bind(input.tax_amount)
        .bind(input.discount_amount)
        .bind(&input.notes)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update order: {}", e)))?;

        timer.observe_duration();

        Ok(order)
    }

    /// Delete a sales order. Only pending or cancelled orders without an
    /// invoice can be deleted; items cascade with the order.
    #[instrument(skip(self))]
    pub async fn delete_sales_order(&self, sales_order_id: Uuid) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_sales_order"])
            .start_timer();

        let current = self
            .get_sales_order(sales_order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Sales order not found")))?;

        let status = SalesOrderStatus::parse(&current.status);
        if !matches!(
            status,
            Some(SalesOrderStatus::Pending) | Some(SalesOrderStatus::Cancelled)
        ) {
            return Err(AppError::DeletionBlocked(anyhow::anyhow!(
                "order in status '{}' cannot be deleted",
                current.status
            )));
        }

        let invoice_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM invoices WHERE sales_order_id = $1",
        )
        .bind(sales_order_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count invoices: {}", e)))?;

        if invoice_count > 0 {
            return Err(AppError::DeletionBlocked(anyhow::anyhow!(
                "order has an invoice"
            )));
        }

        sqlx::query("DELETE FROM sales_orders WHERE sales_order_id = $1")
            .bind(sales_order_id)
            .execute(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete order: {}", e))
            })?;

        timer.observe_duration();

        info!(sales_order_id = %sales_order_id, "Sales order deleted");

        Ok(())
    }
}
