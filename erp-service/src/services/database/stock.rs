//! Stock movement queries. Inserts happen inside lifecycle transactions
//! only; this module is the read side of the ledger.

use super::Database;
use crate::models::{StockMovement, StockMovementFilter};
use crate::services::metrics::DB_QUERY_DURATION;
use erp_core::error::AppError;
use erp_core::pagination::Page;
use tracing::instrument;

const MOVEMENT_COLUMNS: &str = "movement_id, product_id, movement_type, quantity, \
     reference_type, reference_id, note, user_id, created_utc";

impl Database {
    /// Count movements matching a filter.
    #[instrument(skip(self, filter))]
    pub async fn count_stock_movements(
        &self,
        filter: &StockMovementFilter,
    ) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_stock_movements"])
            .start_timer();

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM stock_movements
            WHERE ($1::uuid IS NULL OR product_id = $1)
              AND ($2::varchar IS NULL OR movement_type = $2)
              AND ($3::date IS NULL OR created_utc::date >= $3)
              AND ($4::date IS NULL OR created_utc::date <= $4)
            "#,
        )
        .bind(filter.product_id)
        .bind(filter.movement_type.map(|t| t.as_str()))
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to count movements: {}", e))
        })?;

        timer.observe_duration();

        Ok(count)
    }

    /// List movements matching a filter, newest first.
    #[instrument(skip(self, filter, page))]
    pub async fn list_stock_movements(
        &self,
        filter: &StockMovementFilter,
        page: &Page,
    ) -> Result<Vec<StockMovement>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_stock_movements"])
            .start_timer();

        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}
            FROM stock_movements
            WHERE ($1::uuid IS NULL OR product_id = $1)
              AND ($2::varchar IS NULL OR movement_type = $2)
              AND ($3::date IS NULL OR created_utc::date >= $3)
              AND ($4::date IS NULL OR created_utc::date <= $4)
            ORDER BY created_utc DESC, movement_id
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(filter.product_id)
        .bind(filter.movement_type.map(|t| t.as_str()))
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(page.page_size)
        .bind(page.offset)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list movements: {}", e)))?;

        timer.observe_duration();

        Ok(movements)
    }
}
