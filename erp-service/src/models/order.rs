//! Sales order models and the sales status machine.
//!
//! Stock leaves the warehouse exactly once per order, on the transition out
//! of `pending` into a committed status, and comes back exactly once if the
//! order is later cancelled. `stock_effect` is the single source of truth
//! for which transitions move stock; the lifecycle engine applies it inside
//! one transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Sales order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesOrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

/// Stock consequence of a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    /// Decrement stock per item, movement type `out` / reference `sale`.
    Commit,
    /// Increment stock per item, movement type `in` / reference `return`.
    Restore,
    /// Status-only change.
    None,
}

impl SalesOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesOrderStatus::Pending => "pending",
            SalesOrderStatus::Confirmed => "confirmed",
            SalesOrderStatus::Shipped => "shipped",
            SalesOrderStatus::Delivered => "delivered",
            SalesOrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SalesOrderStatus::Pending),
            "confirmed" => Some(SalesOrderStatus::Confirmed),
            "shipped" => Some(SalesOrderStatus::Shipped),
            "delivered" => Some(SalesOrderStatus::Delivered),
            "cancelled" => Some(SalesOrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        use SalesOrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Shipped)
                | (Confirmed, Cancelled)
                | (Shipped, Delivered)
                | (Shipped, Cancelled)
                | (Delivered, Cancelled)
        )
    }

    /// Stock effect of moving from `self` to `next`, assuming the
    /// transition itself is legal.
    pub fn stock_effect(&self, next: Self) -> StockEffect {
        use SalesOrderStatus::*;
        match (self, next) {
            // First entry into a committed status.
            (Pending, Confirmed) | (Pending, Shipped) | (Pending, Delivered) => StockEffect::Commit,
            // Stock was committed and must come back.
            (Confirmed, Cancelled) | (Shipped, Cancelled) | (Delivered, Cancelled) => {
                StockEffect::Restore
            }
            // Pending -> cancelled never touched stock; committed ->
            // committed already decremented on the way out of pending.
            _ => StockEffect::None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SalesOrder {
    pub sales_order_id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
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
pub struct SalesOrderItem {
    pub item_id: Uuid,
    pub sales_order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderItem {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSalesOrder {
    pub customer_id: Uuid,
    pub order_date: NaiveDate,
    #[validate(nested, length(min = 1))]
    pub items: Vec<CreateOrderItem>,
    pub tax_amount: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub notes: Option<String>,
}

/// Header fields editable while an order is still pending.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSalesOrder {
    pub order_date: Option<NaiveDate>,
    pub tax_amount: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub notes: Option<String>,
}

/// Filter parameters for listing sales orders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalesOrderFilter {
    /// Substring match over the order number.
    pub search: Option<String>,
    pub customer_id: Option<Uuid>,
    pub status: Option<SalesOrderStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use SalesOrderStatus::*;

    const ALL: [SalesOrderStatus; 5] = [Pending, Confirmed, Shipped, Delivered, Cancelled];

    #[test]
    fn cancelled_is_terminal() {
        for next in ALL {
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn delivered_can_only_cancel() {
        for next in ALL {
            assert_eq!(Delivered.can_transition_to(next), next == Cancelled);
        }
    }

    #[test]
    fn no_backward_transitions() {
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Shipped.can_transition_to(Confirmed));
        assert!(!Delivered.can_transition_to(Shipped));
        assert!(!Pending.can_transition_to(Delivered));
    }

    #[test]
    fn stock_committed_exactly_once() {
        assert_eq!(Pending.stock_effect(Confirmed), StockEffect::Commit);
        assert_eq!(Confirmed.stock_effect(Shipped), StockEffect::None);
        assert_eq!(Shipped.stock_effect(Delivered), StockEffect::None);
    }

    #[test]
    fn cancellation_restores_only_after_commit() {
        assert_eq!(Pending.stock_effect(Cancelled), StockEffect::None);
        assert_eq!(Confirmed.stock_effect(Cancelled), StockEffect::Restore);
        assert_eq!(Shipped.stock_effect(Cancelled), StockEffect::Restore);
        assert_eq!(Delivered.stock_effect(Cancelled), StockEffect::Restore);
    }

    #[test]
    fn status_round_trips() {
        for status in ALL {
            assert_eq!(SalesOrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SalesOrderStatus::parse("unknown"), None);
    }
}
