//! Customer repository.

use super::Database;
use crate::models::{CreateCustomer, Customer, CustomerFilter, CustomerWithStats, UpdateCustomer};
use crate::services::metrics::DB_QUERY_DURATION;
use erp_core::error::AppError;
use erp_core::pagination::Page;
use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

const CUSTOMER_COLUMNS: &str =
    "customer_id, name, email, phone, address, city, country, credit_limit, status, created_utc";

impl Database {
    /// Create a new customer.
    #[instrument(skip(self, input))]
    pub async fn create_customer(&self, input: &CreateCustomer) -> Result<Customer, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_customer"])
            .start_timer();

        let customer_id = Uuid::new_v4();
        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (customer_id, name, email, phone, address, city, country, credit_limit)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(customer_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.country)
        .bind(input.credit_limit.unwrap_or(Decimal::ZERO))
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create customer: {}", e)))?;

        timer.observe_duration();

        info!(customer_id = %customer.customer_id, "Customer created");

        Ok(customer)
    }

    /// Get a customer with order statistics.
    #[instrument(skip(self))]
    pub async fn get_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<CustomerWithStats>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, CustomerWithStats>(
            r#"
            SELECT c.customer_id, c.name, c.email, c.phone, c.address, c.city, c.country,
                   c.credit_limit, c.status, c.created_utc,
                   COUNT(o.sales_order_id) AS order_count,
                   COALESCE(SUM(o.total_amount), 0) AS total_value
            FROM customers c
            LEFT JOIN sales_orders o
                   ON o.customer_id = c.customer_id AND o.status <> 'cancelled'
            WHERE c.customer_id = $1
            GROUP BY c.customer_id
            "#,
        )
        .bind(customer_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e)))?;

        timer.observe_duration();

        Ok(customer)
    }

    /// Count customers matching a filter.
    #[instrument(skip(self, filter))]
    pub async fn count_customers(&self, filter: &CustomerFilter) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_customers"])
            .start_timer();

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM customers
            WHERE ($1::varchar IS NULL OR name ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%')
              AND ($2::varchar IS NULL OR status = $2)
            "#,
        )
        .bind(&filter.search)
        .bind(&filter.status)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count customers: {}", e)))?;

        timer.observe_duration();

        Ok(count)
    }

    /// List customers with order statistics, windowed by `page`.
    #[instrument(skip(self, filter, page))]
    pub async fn list_customers(
        &self,
        filter: &CustomerFilter,
        page: &Page,
    ) -> Result<Vec<CustomerWithStats>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_customers"])
            .start_timer();

        let customers = sqlx::query_as::<_, CustomerWithStats>(
            r#"
            SELECT c.customer_id, c.name, c.email, c.phone, c.address, c.city, c.country,
                   c.credit_limit, c.status, c.created_utc,
                   COUNT(o.sales_order_id) AS order_count,
                   COALESCE(SUM(o.total_amount), 0) AS total_value
            FROM customers c
            LEFT JOIN sales_orders o
                   ON o.customer_id = c.customer_id AND o.status <> 'cancelled'
            WHERE ($1::varchar IS NULL OR c.name ILIKE '%' || $1 || '%' OR c.email ILIKE '%' || $1 || '%')
              AND ($2::varchar IS NULL OR c.status = $2)
            GROUP BY c.customer_id
            ORDER BY c.name
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&filter.search)
        .bind(&filter.status)
        .bind(page.page_size)
        .bind(page.offset)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list customers: {}", e)))?;

        timer.observe_duration();

        Ok(customers)
    }

    /// Update a customer.
    #[instrument(skip(self, input))]
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        input: &UpdateCustomer,
    ) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                city = COALESCE($6, city),
                country = COALESCE($7, country),
                credit_limit = COALESCE($8, credit_limit),
                status = COALESCE($9, status)
            WHERE customer_id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(customer_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.country)
        .bind(input.credit_limit)
        .bind(&input.status)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update customer: {}", e)))?;

        timer.observe_duration();

        Ok(customer)
    }

    /// Delete a customer. Blocked while sales orders reference them.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, customer_id: Uuid) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_customer"])
            .start_timer();

        let order_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sales_orders WHERE customer_id = $1",
        )
        .bind(customer_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count orders: {}", e)))?;

        if order_count > 0 {
            return Err(AppError::DeletionBlocked(anyhow::anyhow!(
                "customer has {} order(s)",
                order_count
            )));
        }

        let result = sqlx::query("DELETE FROM customers WHERE customer_id = $1")
            .bind(customer_id)
            .execute(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete customer: {}", e))
            })?;

        timer.observe_duration();

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Customer not found")));
        }

        info!(customer_id = %customer_id, "Customer deleted");

        Ok(())
    }
}
