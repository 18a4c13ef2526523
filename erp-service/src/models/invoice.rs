//! Invoice and payment models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Partial,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Partial => "partial",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(InvoiceStatus::Draft),
            "sent" => Some(InvoiceStatus::Sent),
            "paid" => Some(InvoiceStatus::Paid),
            "partial" => Some(InvoiceStatus::Partial),
            "overdue" => Some(InvoiceStatus::Overdue),
            "cancelled" => Some(InvoiceStatus::Cancelled),
            _ => None,
        }
    }

    /// Status after the completed-payment sum changes.
    ///
    /// `paid` is absorbing: once an invoice is fully settled further
    /// payments never move it back to `partial`.
    pub fn after_payment(self, total_amount: Decimal, completed_sum: Decimal) -> Self {
        if self == InvoiceStatus::Paid || completed_sum >= total_amount {
            InvoiceStatus::Paid
        } else if completed_sum > Decimal::ZERO {
            InvoiceStatus::Partial
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub sales_order_id: Option<Uuid>,
    pub customer_id: Uuid,
    pub user_id: Uuid,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub status: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Invoice line, copied from the order items at generation time and
/// independent of the order thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceItem {
    pub item_id: Uuid,
    pub invoice_id: Uuid,
    pub product_id: Option<Uuid>,
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "pending" => PaymentStatus::Pending,
            "failed" => PaymentStatus::Failed,
            _ => PaymentStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub payment_id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: String,
    pub reference: Option<String>,
    pub status: String,
    pub user_id: Uuid,
    pub created_utc: DateTime<Utc>,
}

/// Input for generating an invoice from a sales order.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateInvoice {
    pub sales_order_id: Uuid,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePayment {
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    #[validate(length(min = 1, max = 32))]
    pub payment_method: String,
    #[validate(length(max = 128))]
    pub reference: Option<String>,
    pub status: Option<PaymentStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceFilter {
    /// Substring match over the invoice number.
    pub search: Option<String>,
    pub customer_id: Option<Uuid>,
    pub status: Option<InvoiceStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn exact_payment_settles_the_invoice() {
        let status = InvoiceStatus::Sent.after_payment(amount(10000), amount(10000));
        assert_eq!(status, InvoiceStatus::Paid);
    }

    #[test]
    fn partial_payment_marks_partial() {
        let status = InvoiceStatus::Sent.after_payment(amount(10000), amount(4000));
        assert_eq!(status, InvoiceStatus::Partial);
    }

    #[test]
    fn overpayment_is_still_paid() {
        let status = InvoiceStatus::Partial.after_payment(amount(10000), amount(15000));
        assert_eq!(status, InvoiceStatus::Paid);
    }

    #[test]
    fn paid_never_reverts() {
        // A later recompute with a smaller completed sum (e.g. a payment
        // marked failed afterwards) must not demote a settled invoice.
        let status = InvoiceStatus::Paid.after_payment(amount(10000), amount(6000));
        assert_eq!(status, InvoiceStatus::Paid);
    }

    #[test]
    fn zero_sum_leaves_status_untouched() {
        let status = InvoiceStatus::Sent.after_payment(amount(10000), Decimal::ZERO);
        assert_eq!(status, InvoiceStatus::Sent);
        let status = InvoiceStatus::Overdue.after_payment(amount(10000), Decimal::ZERO);
        assert_eq!(status, InvoiceStatus::Overdue);
    }
}
