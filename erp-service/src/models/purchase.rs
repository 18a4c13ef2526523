//! Purchase order models and the purchasing status machine.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Purchase order status. Stock is received exactly once, on the
/// `ordered -> received` transition; `received` is terminal, so a duplicate
/// submission cannot receive the goods twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Pending,
    Approved,
    Ordered,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Pending => "pending",
            PurchaseOrderStatus::Approved => "approved",
            PurchaseOrderStatus::Ordered => "ordered",
            PurchaseOrderStatus::Received => "received",
            PurchaseOrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PurchaseOrderStatus::Pending),
            "approved" => Some(PurchaseOrderStatus::Approved),
            "ordered" => Some(PurchaseOrderStatus::Ordered),
            "received" => Some(PurchaseOrderStatus::Received),
            "cancelled" => Some(PurchaseOrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        use PurchaseOrderStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Cancelled)
                | (Approved, Ordered)
                | (Approved, Cancelled)
                | (Ordered, Received)
                | (Ordered, Cancelled)
        )
    }

    /// Whether moving from `self` to `next` receives stock.
    pub fn receives_stock(&self, next: Self) -> bool {
        *self == PurchaseOrderStatus::Ordered && next == PurchaseOrderStatus::Received
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PurchaseOrder {
    pub purchase_order_id: Uuid,
    pub order_number: String,
    pub supplier_id: Uuid,
    pub user_id: Uuid,
    pub order_date: NaiveDate,
    pub status: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PurchaseOrderItem {
    pub item_id: Uuid,
    pub purchase_order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePurchaseItem {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePurchaseOrder {
    pub supplier_id: Uuid,
    pub order_date: NaiveDate,
    #[validate(nested, length(min = 1))]
    pub items: Vec<CreatePurchaseItem>,
    pub tax_amount: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub notes: Option<String>,
}

/// Header fields editable while an order is still pending.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePurchaseOrder {
    pub order_date: Option<NaiveDate>,
    pub tax_amount: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseOrderFilter {
    pub search: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub status: Option<PurchaseOrderStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use PurchaseOrderStatus::*;

    const ALL: [PurchaseOrderStatus; 5] = [Pending, Approved, Ordered, Received, Cancelled];

    #[test]
    fn received_and_cancelled_are_terminal() {
        for next in ALL {
            assert!(!Received.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn stock_received_only_from_ordered() {
        assert!(Ordered.receives_stock(Received));
        assert!(!Pending.receives_stock(Received));
        assert!(!Approved.receives_stock(Received));
        assert!(!Received.receives_stock(Received));
        assert!(!Ordered.receives_stock(Cancelled));
    }

    #[test]
    fn forward_path_is_linear() {
        assert!(Pending.can_transition_to(Approved));
        assert!(Approved.can_transition_to(Ordered));
        assert!(Ordered.can_transition_to(Received));
        assert!(!Pending.can_transition_to(Ordered));
        assert!(!Approved.can_transition_to(Received));
    }
}
