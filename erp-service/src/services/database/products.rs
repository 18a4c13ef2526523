//! Product and category repository.

use super::Database;
use crate::models::{
    Category, CreateCategory, CreateProduct, Product, ProductFilter, UpdateCategory, UpdateProduct,
};
use crate::services::metrics::DB_QUERY_DURATION;
use erp_core::error::AppError;
use erp_core::pagination::Page;
use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = "product_id, sku, name, description, category_id, stock_quantity, \
     min_stock_level, max_stock_level, cost_price, unit_price, status, created_utc, updated_utc";

impl Database {
    // -------------------------------------------------------------------------
    // Category Operations
    // -------------------------------------------------------------------------

    /// Create a new category.
    #[instrument(skip(self, input))]
    pub async fn create_category(&self, input: &CreateCategory) -> Result<Category, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_category"])
            .start_timer();

        let category_id = Uuid::new_v4();
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (category_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING category_id, name, description, created_utc
            "#,
        )
        .bind(category_id)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Category '{}' already exists", input.name))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create category: {}", e)),
        })?;

        timer.observe_duration();

        info!(category_id = %category.category_id, name = %category.name, "Category created");

        Ok(category)
    }

    /// Get a category by ID.
    #[instrument(skip(self))]
    pub async fn get_category(&self, category_id: Uuid) -> Result<Option<Category>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_category"])
            .start_timer();

        let category = sqlx::query_as::<_, Category>(
            "SELECT category_id, name, description, created_utc FROM categories WHERE category_id = $1",
        )
        .bind(category_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get category: {}", e)))?;

        timer.observe_duration();

        Ok(category)
    }

    /// List all categories ordered by name.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_categories"])
            .start_timer();

        let categories = sqlx::query_as::<_, Category>(
            "SELECT category_id, name, description, created_utc FROM categories ORDER BY name",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list categories: {}", e)))?;

        timer.observe_duration();

        Ok(categories)
    }

    /// Update a category.
    #[instrument(skip(self, input))]
    pub async fn update_category(
        &self,
        category_id: Uuid,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_category"])
            .start_timer();

        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE category_id = $1
            RETURNING category_id, name, description, created_utc
            "#,
        )
        .bind(category_id)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Category name already in use"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update category: {}", e)),
        })?;

        timer.observe_duration();

        Ok(category)
    }

    /// Delete a category. Blocked while products still reference it.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_category"])
            .start_timer();

        let product_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE category_id = $1",
        )
        .bind(category_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count products: {}", e)))?;

        if product_count > 0 {
            return Err(AppError::DeletionBlocked(anyhow::anyhow!(
                "category has {} product(s) assigned to it",
                product_count
            )));
        }

        let result = sqlx::query("DELETE FROM categories WHERE category_id = $1")
            .bind(category_id)
            .execute(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete category: {}", e))
            })?;

        timer.observe_duration();

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Category not found")));
        }

        info!(category_id = %category_id, "Category deleted");

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Product Operations
    // -------------------------------------------------------------------------

    /// Create a new product.
    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_product(&self, input: &CreateProduct) -> Result<Product, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_product"])
            .start_timer();

        let product_id = Uuid::new_v4();
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (
                product_id, sku, name, description, category_id, stock_quantity,
                min_stock_level, max_stock_level, cost_price, unit_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product_id)
        .bind(&input.sku)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.category_id)
        .bind(input.stock_quantity.unwrap_or(0))
        .bind(input.min_stock_level.unwrap_or(0))
        .bind(input.max_stock_level.unwrap_or(0))
        .bind(input.cost_price.unwrap_or(Decimal::ZERO))
        .bind(input.unit_price.unwrap_or(Decimal::ZERO))
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("SKU '{}' already exists", input.sku))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create product: {}", e)),
        })?;

        timer.observe_duration();

        info!(product_id = %product.product_id, sku = %product.sku, "Product created");

        Ok(product)
    }

    /// Get a product by ID.
    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = $1"
        ))
        .bind(product_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get product: {}", e)))?;

        timer.observe_duration();

        Ok(product)
    }

    /// Count products matching a filter. Shares its predicates with
    /// `list_products` so the total stays correct at any page.
    #[instrument(skip(self, filter))]
    pub async fn count_products(&self, filter: &ProductFilter) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_products"])
            .start_timer();

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM products
            WHERE ($1::varchar IS NULL OR name ILIKE '%' || $1 || '%' OR sku ILIKE '%' || $1 || '%')
              AND ($2::uuid IS NULL OR category_id = $2)
              AND ($3::varchar IS NULL OR status = $3)
              AND ($4::bool IS NOT TRUE OR stock_quantity <= min_stock_level)
            "#,
        )
        .bind(&filter.search)
        .bind(filter.category_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.low_stock)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count products: {}", e)))?;

        timer.observe_duration();

        Ok(count)
    }

    /// List products matching a filter, windowed by `page`.
    #[instrument(skip(self, filter, page))]
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page: &Page,
    ) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_products"])
            .start_timer();

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ($1::varchar IS NULL OR name ILIKE '%' || $1 || '%' OR sku ILIKE '%' || $1 || '%')
              AND ($2::uuid IS NULL OR category_id = $2)
              AND ($3::varchar IS NULL OR status = $3)
              AND ($4::bool IS NOT TRUE OR stock_quantity <= min_stock_level)
            ORDER BY name
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(&filter.search)
        .bind(filter.category_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.low_stock)
        .bind(page.page_size)
        .bind(page.offset)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list products: {}", e)))?;

        timer.observe_duration();

        Ok(products)
    }

    /// Update a product. Stock quantity is deliberately not updatable here;
    /// every stock change goes through the lifecycle service so it is paired
    /// with a movement row.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                category_id = COALESCE($4, category_id),
                min_stock_level = COALESCE($5, min_stock_level),
                max_stock_level = COALESCE($6, max_stock_level),
                cost_price = COALESCE($7, cost_price),
                unit_price = COALESCE($8, unit_price),
                status = COALESCE($9, status),
                updated_utc = now()
            WHERE product_id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.category_id)
        .bind(input.min_stock_level)
        .bind(input.max_stock_level)
        .bind(input.cost_price)
        .bind(input.unit_price)
        .bind(input.status.map(|s| s.as_str()))
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update product: {}", e)))?;

        timer.observe_duration();

        Ok(product)
    }

    /// Delete a product. Blocked while movements or order items reference it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_product"])
            .start_timer();

        let reference_count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT (SELECT COUNT(*) FROM stock_movements WHERE product_id = $1)
                 + (SELECT COUNT(*) FROM sales_order_items WHERE product_id = $1)
                 + (SELECT COUNT(*) FROM purchase_order_items WHERE product_id = $1)
            "#,
        )
        .bind(product_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to count references: {}", e))
        })?;

        if reference_count > 0 {
            return Err(AppError::DeletionBlocked(anyhow::anyhow!(
                "product is referenced by {} movement(s) or order item(s)",
                reference_count
            )));
        }

        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(product_id)
            .execute(self.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete product: {}", e))
            })?;

        timer.observe_duration();

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Product not found")));
        }

        info!(product_id = %product_id, "Product deleted");

        Ok(())
    }
}
