//! Stock movement ledger models.
//!
//! Every change to a product's stock quantity is paired with exactly one
//! movement row. Movements are append-only; there is no update or delete
//! path for them anywhere in the service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    In,
    Out,
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Adjustment => "adjustment",
        }
    }
}

/// What caused a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementRef {
    Purchase,
    Sale,
    Adjustment,
    Return,
}

impl MovementRef {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementRef::Purchase => "purchase",
            MovementRef::Sale => "sale",
            MovementRef::Adjustment => "adjustment",
            MovementRef::Return => "return",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StockMovement {
    pub movement_id: Uuid,
    pub product_id: Uuid,
    pub movement_type: String,
    pub quantity: i32,
    pub reference_type: String,
    pub reference_id: Option<Uuid>,
    pub note: Option<String>,
    pub user_id: Uuid,
    pub created_utc: DateTime<Utc>,
}

/// Manual stock adjustment. A positive delta adds stock, a negative delta
/// removes it; the result may never go below zero.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StockAdjustment {
    pub product_id: Uuid,
    pub delta: i32,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockMovementFilter {
    pub product_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
