//! Supplier repository. Mirrors the customer repository with purchase
//! orders as the dependent table.

use super::Database;
use crate::models::{CreateSupplier, Supplier, SupplierFilter, SupplierWithStats, UpdateSupplier};
use crate::services::metrics::DB_QUERY_DURATION;
use erp_core::error::AppError;
use erp_core::pagination::Page;
use tracing::{info, instrument};
use uuid::Uuid;

const SUPPLIER_COLUMNS: &str =
    "supplier_id, name, contact_name, email, phone, address, city, country, status, created_utc";

impl Database {
    /// Create a new supplier.
    #[instrument(skip(self, input))]
    pub async fn create_supplier(&self, input: &CreateSupplier) -> Result<Supplier, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_supplier"])
            .start_timer();

        let supplier_id = Uuid::new_v4();
        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            INSERT INTO suppliers (supplier_id, name, contact_name, email, phone, address, city, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(supplier_id)
        .bind(&input.name)
        .bind(&input.contact_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.country)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create supplier: {}", e)))?;

        timer.observe_duration();

        info!(supplier_id = %supplier.supplier_id, "Supplier created");

        Ok(supplier)
    }

    /// Get a supplier with purchase statistics.
    #[instrument(skip(self))]
    pub async fn get_supplier(
        &self,
        supplier_id: Uuid,
    ) -> Result<Option<SupplierWithStats>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_supplier"])
            .start_timer();

        let supplier = sqlx::query_as::<_, SupplierWithStats>(
            r#"
            SELECT s.supplier_id, s.name, s.contact_name, s.email, s.phone, s.address,
                   s.city, s.country, s.status, s.created_utc,
                   COUNT(o.purchase_order_id) AS order_count,
                   COALESCE(SUM(o.total_amount), 0) AS total_value
            FROM suppliers s
            LEFT JOIN purchase_orders o
                   ON o.supplier_id = s.supplier_id AND o.status <> 'cancelled'
            WHERE s.supplier_id = $1
            GROUP BY s.supplier_id
            "#,
        )
        .bind(supplier_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get supplier: {}", e)))?;

        timer.observe_duration();

        Ok(supplier)
    }

    /// Count suppliers matching a filter.
    #[instrument(skip(self, filter))]
    pub async fn count_suppliers(&self, filter: &SupplierFilter) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_suppliers"])
            .start_timer();

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM suppliers
            WHERE ($1::varchar IS NULL OR name ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%')
              AND ($2::varchar IS NULL OR status = $2)
            "#,
        )
        .bind(&filter.search)
        .bind(&filter.status)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count suppliers: {}", e)))?;

        timer.observe_duration();

        Ok(count)
    }

    /// List suppliers with purchase statistics, windowed by `page`.
    #[instrument(skip(self, filter, page))]
    pub async fn list_suppliers(
        &self,
        filter: &SupplierFilter,
        page: &Page,
    ) -> Result<Vec<SupplierWithStats>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_suppliers"])
            .start_timer();

        let suppliers = sqlx::query_as::<_, SupplierWithStats>(
            r#"
            SELECT s.supplier_id, s.name, s.contact_name, s.email, s.phone, s.address,
                   s.city, s.country, s.status, s.created_utc,
                   COUNT(o.purchase_order_id) AS order_count,
                   COALESCE(SUM(o.total_amount), 0) AS total_value
            FROM suppliers s
            LEFT JOIN purchase_orders o
                   ON o.supplier_id = s.supplier_id AND o.status <> 'cancelled'
            WHERE ($1::varchar IS NULL OR s.name ILIKE '%' || $1 || '%' OR s.email ILIKE '%' || $1 || '%')
              AND ($2::varchar IS NULL OR s.status = $2)
            GROUP BY s.supplier_id
            ORDER BY s.name
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&filter.search)
        .bind(&filter.status)
        .bind(page.page_size)
        .bind(page.offset)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list suppliers: {}", e)))?;

        timer.observe_duration();

        Ok(suppliers)
    }

    /// Update a supplier.
    #[instrument(skip(self, input))]
    pub async fn update_supplier(
        &self,
        supplier_id: Uuid,
        input: &UpdateSupplier,
    ) -> Result<Option<Supplier>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_supplier"])
            .start_timer();

        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            UPDATE suppliers
            SET name = COALESCE($2, name),
                contact_name = COALESCE($3, contact_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                address = COALESCE($6, address),
                city = COALESCE($7, city),
                country = COALESCE($8, country),
                status = COALESCE($9, status)
            WHERE supplier_id = $1
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(supplier_id)
        .bind(&input.name)
        .bind(&input.contact_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.country)
        .bind(&input.status)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update supplier: {}", e)))?;

        timer.observe_duration();

        Ok(supplier)
    }

    /// Delete a supplier. Blocked while purchase orders reference them.
    #[instrument(skip(self))]
    pub async fn delete_supplier(&self, supplier_id: Uuid) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_supplier"])
            .start_timer();

        let order_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM purchase_orders WHERE supplier_id = $1",
        )
        .bind(supplier_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count orders: {}", e)))?;

        if order_count > 0 {
            return Err(AppError::DeletionBlocked(anyhow::anyhow!(
                "supplier has {} purchase order(s)",
                order_count
            )));
        }

        let result = sqlx::query("DELETE FROM suppliers WHERE supplier_id = $1")
            .bind(supplier_id)
            .execute(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete supplier: {}", e))
            })?;

        timer.observe_duration();

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Supplier not found")));
        }

        info!(supplier_id = %supplier_id, "Supplier deleted");

        Ok(())
    }
}
