//! Activity log queries. Inserts go through the audit service.

use super::Database;
use crate::models::{ActivityFilter, ActivityLog};
use crate::services::metrics::DB_QUERY_DURATION;
use erp_core::error::AppError;
use erp_core::pagination::Page;
use tracing::instrument;

const ACTIVITY_COLUMNS: &str = "activity_id, user_id, action, table_name, record_id, \
     old_values, new_values, ip, user_agent, created_utc";

impl Database {
    /// Count activity entries matching a filter.
    #[instrument(skip(self, filter))]
    pub async fn count_activity(&self, filter: &ActivityFilter) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_activity"])
            .start_timer();

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM activity_log
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::varchar IS NULL OR table_name = $2)
              AND ($3::varchar IS NULL OR action = $3)
              AND ($4::date IS NULL OR created_utc::date >= $4)
              AND ($5::date IS NULL OR created_utc::date <= $5)
            "#,
        )
        .bind(filter.user_id)
        .bind(&filter.table_name)
        .bind(&filter.action)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count activity: {}", e)))?;

        timer.observe_duration();

        Ok(count)
    }

    /// List activity entries matching a filter, newest first.
    #[instrument(skip(self, filter, page))]
    pub async fn list_activity(
        &self,
        filter: &ActivityFilter,
        page: &Page,
    ) -> Result<Vec<ActivityLog>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_activity"])
            .start_timer();

        let entries = sqlx::query_as::<_, ActivityLog>(&format!(
            r#"
            SELECT {ACTIVITY_COLUMNS}
            FROM activity_log
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::varchar IS NULL OR table_name = $2)
              AND ($3::varchar IS NULL OR action = $3)
              AND ($4::date IS NULL OR created_utc::date >= $4)
              AND ($5::date IS NULL OR created_utc::date <= $5)
            ORDER BY created_utc DESC, activity_id
            LIMIT $6 OFFSET $7
            "#
        ))
        .bind(filter.user_id)
        .bind(&filter.table_name)
        .bind(&filter.action)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(page.page_size)
        .bind(page.offset)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list activity: {}", e)))?;

        timer.observe_duration();

        Ok(entries)
    }
}
