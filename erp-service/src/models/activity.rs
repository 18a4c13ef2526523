//! Activity log model. Rows are append-only.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityLog {
    pub activity_id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub table_name: String,
    pub record_id: Option<Uuid>,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityFilter {
    pub user_id: Option<Uuid>,
    pub table_name: Option<String>,
    pub action: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
