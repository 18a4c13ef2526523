//! Shared helpers for database-backed integration tests.
//!
//! Tests run against the database named by `TEST_DATABASE_URL` and skip
//! cleanly when it is not set. Every helper salts unique fields so tests
//! can run concurrently against one database.

#![allow(dead_code)]

use chrono::NaiveDate;
use erp_core::authz::Role;
use erp_core::context::RequestContext;
use erp_core::config::DatabaseConfig;
use erp_service::models::{
    CreateCustomer, CreateOrderItem, CreateProduct, CreateSalesOrder, CreateSupplier, CreateUser,
    Customer, Product, SalesOrder, Supplier, User,
};
use erp_service::services::{Database, Lifecycle};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Connect and migrate, or `None` when no test database is configured.
pub async fn test_db() -> Option<Database> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping database test");
        return None;
    };

    let config = DatabaseConfig {
        url,
        max_connections: 5,
        min_connections: 1,
        statement_timeout_secs: 30,
    };
    let db = Database::new(&config).await.expect("connect test database");
    db.run_migrations().await.expect("run migrations");
    Some(db)
}

pub fn lifecycle(db: &Database) -> Lifecycle {
    Lifecycle::new(db.clone())
}

fn salt() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

pub fn amount(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub fn order_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

/// Seed a user and build the request context acting as them.
pub async fn seed_user(db: &Database, role: Role) -> (User, RequestContext) {
    let salt = salt();
    let input = CreateUser {
        username: format!("user-{salt}"),
        email: format!("user-{salt}@example.com"),
        password: "integration-test".to_string(),
        role,
        language: None,
    };
    let user = db
        .create_user(&input, "$argon2id$test$hash")
        .await
        .expect("create user");

    let ctx = RequestContext {
        user_id: user.user_id,
        username: user.username.clone(),
        role,
        locale: "en".to_string(),
        ip: None,
        user_agent: None,
    };

    (user, ctx)
}

pub async fn seed_product(db: &Database, stock: i32) -> Product {
    let salt = salt();
    let input = CreateProduct {
        sku: format!("SKU-{salt}"),
        name: format!("Product {salt}"),
        description: None,
        category_id: None,
        stock_quantity: Some(stock),
        min_stock_level: Some(5),
        max_stock_level: Some(100),
        cost_price: Some(amount(500)),
        unit_price: Some(amount(999)),
    };
    db.create_product(&input).await.expect("create product")
}

pub async fn seed_customer(db: &Database) -> Customer {
    let salt = salt();
    let input = CreateCustomer {
        name: format!("Customer {salt}"),
        email: Some(format!("customer-{salt}@example.com")),
        phone: None,
        address: None,
        city: None,
        country: None,
        credit_limit: None,
    };
    db.create_customer(&input).await.expect("create customer")
}

pub async fn seed_supplier(db: &Database) -> Supplier {
    let salt = salt();
    let input = CreateSupplier {
        name: format!("Supplier {salt}"),
        contact_name: None,
        email: Some(format!("supplier-{salt}@example.com")),
        phone: None,
        address: None,
        city: None,
        country: None,
    };
    db.create_supplier(&input).await.expect("create supplier")
}

/// Seed a pending sales order with the given (product, quantity) lines at
/// the product's unit price.
pub async fn seed_sales_order(
    db: &Database,
    ctx: &RequestContext,
    customer: &Customer,
    lines: &[(&Product, i32)],
) -> SalesOrder {
    let items = lines
        .iter()
        .map(|(product, quantity)| CreateOrderItem {
            product_id: product.product_id,
            quantity: *quantity,
            unit_price: product.unit_price,
        })
        .collect();
    let input = CreateSalesOrder {
        customer_id: customer.customer_id,
        order_date: order_date(),
        items,
        tax_amount: None,
        discount_amount: None,
        notes: None,
    };
    db.create_sales_order(ctx.user_id, &input)
        .await
        .expect("create sales order")
}

/// Current stock quantity straight from the products table.
pub async fn stock_of(db: &Database, product: &Product) -> i32 {
    sqlx::query_scalar::<_, i32>("SELECT stock_quantity FROM products WHERE product_id = $1")
        .bind(product.product_id)
        .fetch_one(db.pool())
        .await
        .expect("read stock")
}
