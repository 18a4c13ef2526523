//! Product and category models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Product status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    Inactive,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "inactive" => ProductStatus::Inactive,
            _ => ProductStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Product record. `category_name` is joined in by the listing queries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub stock_quantity: i32,
    pub min_stock_level: i32,
    pub max_stock_level: i32,
    pub cost_price: Decimal,
    pub unit_price: Decimal,
    pub status: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    #[validate(range(min = 0))]
    pub stock_quantity: Option<i32>,
    #[validate(range(min = 0))]
    pub min_stock_level: Option<i32>,
    #[validate(range(min = 0))]
    pub max_stock_level: Option<i32>,
    pub cost_price: Option<Decimal>,
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    #[validate(range(min = 0))]
    pub min_stock_level: Option<i32>,
    #[validate(range(min = 0))]
    pub max_stock_level: Option<i32>,
    pub cost_price: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub status: Option<ProductStatus>,
}

/// Filter parameters for listing products.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring match over name and sku.
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub status: Option<ProductStatus>,
    /// Only products at or below their minimum stock level.
    pub low_stock: Option<bool>,
}
