//! Activity trail recording.
//!
//! Called after the primary mutation has committed. Recording is
//! best-effort: a failed insert is logged and swallowed, and must never
//! roll back or fail the business change it describes.

use crate::services::database::Database;
use erp_core::context::RequestContext;
use tracing::{error, instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct AuditTrail {
    db: Database,
}

impl AuditTrail {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Append one activity row for a committed mutation. `old_values` and
    /// `new_values` carry the row snapshots relevant to the change.
    #[instrument(skip(self, ctx, old_values, new_values), fields(user_id = %ctx.user_id))]
    pub async fn record(
        &self,
        ctx: &RequestContext,
        action: &str,
        table_name: &str,
        record_id: Option<Uuid>,
        old_values: Option<serde_json::Value>,
        new_values: Option<serde_json::Value>,
    ) {
        let result = sqlx::query(
            r#"
            INSERT INTO activity_log (activity_id, user_id, action, table_name, record_id, old_values, new_values, ip, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(ctx.user_id)
        .bind(action)
        .bind(table_name)
        .bind(record_id)
        .bind(old_values)
        .bind(new_values)
        .bind(&ctx.ip)
        .bind(&ctx.user_agent)
        .execute(self.db.pool())
        .await;

        if let Err(e) = result {
            error!(
                action = action,
                table_name = table_name,
                error = %e,
                "Failed to record activity"
            );
        }
    }
}
