//! Repository integration tests: uniqueness, guarded deletion, filtered
//! listings, and manual stock adjustments.

mod common;

use common::{amount, lifecycle, seed_customer, seed_product, seed_sales_order, seed_user};
use erp_core::authz::Role;
use erp_core::error::AppError;
use erp_core::pagination::Page;
use erp_service::models::{
    CreateCategory, CreateProduct, CreatePurchaseItem, CreatePurchaseOrder, ProductFilter,
    StockAdjustment, UpdateProduct,
};
use erp_service::services::database::UserDeleteOutcome;
use uuid::Uuid;

#[tokio::test]
async fn duplicate_sku_is_a_conflict() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let product = seed_product(&db, 1).await;

    let input = CreateProduct {
        sku: product.sku.clone(),
        name: "Duplicate".to_string(),
        description: None,
        category_id: None,
        stock_quantity: None,
        min_stock_level: None,
        max_stock_level: None,
        cost_price: None,
        unit_price: None,
    };
    let err = db
        .create_product(&input)
        .await
        .expect_err("duplicate sku must fail");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn category_with_products_cannot_be_deleted() {
    let Some(db) = common::test_db().await else {
        return;
    };

    let category = db
        .create_category(&CreateCategory {
            name: format!("Hardware {}", Uuid::new_v4().simple()),
            description: None,
        })
        .await
        .expect("create category");

    let product = seed_product(&db, 1).await;
    db.update_product(
        product.product_id,
        &UpdateProduct {
            category_id: Some(category.category_id),
            ..Default::default()
        },
    )
    .await
    .expect("assign category");

    let err = db
        .delete_category(category.category_id)
        .await
        .expect_err("deletion must be blocked");
    assert!(matches!(err, AppError::DeletionBlocked(_)));

    // Both rows are still there.
    assert!(db
        .get_category(category.category_id)
        .await
        .expect("get category")
        .is_some());
    assert!(db
        .get_product(product.product_id)
        .await
        .expect("get product")
        .is_some());
}

#[tokio::test]
async fn customer_and_supplier_with_orders_cannot_be_deleted() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let (_, ctx) = seed_user(&db, Role::Manager).await;
    let product = seed_product(&db, 10).await;

    let customer = seed_customer(&db).await;
    seed_sales_order(&db, &ctx, &customer, &[(&product, 1)]).await;
    let err = db
        .delete_customer(customer.customer_id)
        .await
        .expect_err("customer deletion must be blocked");
    assert!(matches!(err, AppError::DeletionBlocked(_)));

    let supplier = common::seed_supplier(&db).await;
    db.create_purchase_order(
        ctx.user_id,
        &CreatePurchaseOrder {
            supplier_id: supplier.supplier_id,
            order_date: common::order_date(),
            items: vec![CreatePurchaseItem {
                product_id: product.product_id,
                quantity: 1,
                unit_price: amount(500),
            }],
            tax_amount: None,
            discount_amount: None,
            notes: None,
        },
    )
    .await
    .expect("create purchase order");
    let err = db
        .delete_supplier(supplier.supplier_id)
        .await
        .expect_err("supplier deletion must be blocked");
    assert!(matches!(err, AppError::DeletionBlocked(_)));
}

#[tokio::test]
async fn user_with_orders_is_deactivated_not_deleted() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let (user, ctx) = seed_user(&db, Role::Employee).await;
    let product = seed_product(&db, 10).await;
    let customer = seed_customer(&db).await;
    seed_sales_order(&db, &ctx, &customer, &[(&product, 1)]).await;

    let outcome = db.delete_user(user.user_id).await.expect("delete user");
    assert_eq!(outcome, UserDeleteOutcome::Deactivated);

    let user = db
        .get_user(user.user_id)
        .await
        .expect("get user")
        .expect("user still exists");
    assert_eq!(user.status, "inactive");

    // A user without history is actually removed.
    let (other, _) = seed_user(&db, Role::Employee).await;
    let outcome = db.delete_user(other.user_id).await.expect("delete user");
    assert_eq!(outcome, UserDeleteOutcome::Deleted);
    assert!(db
        .get_user(other.user_id)
        .await
        .expect("get user")
        .is_none());
}

#[tokio::test]
async fn product_listing_filters_and_counts_agree() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let needle = format!("needle-{}", Uuid::new_v4().simple());

    for i in 0..3 {
        db.create_product(&CreateProduct {
            sku: format!("{needle}-{i}"),
            name: format!("Widget {needle} {i}"),
            description: None,
            category_id: None,
            stock_quantity: Some(10),
            min_stock_level: Some(0),
            max_stock_level: Some(0),
            cost_price: None,
            unit_price: None,
        })
        .await
        .expect("create product");
    }

    let filter = ProductFilter {
        search: Some(needle.clone()),
        ..Default::default()
    };
    let total = db.count_products(&filter).await.expect("count");
    assert_eq!(total, 3);

    // Page 2 of 2-per-page holds the single remaining row.
    let page = Page::compute(total, 2, 2);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.offset, 2);
    let products = db.list_products(&filter, &page).await.expect("list");
    assert_eq!(products.len(), 1);
}

#[tokio::test]
async fn stock_adjustment_moves_both_ways_but_never_negative() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let engine = lifecycle(&db);
    let (_, ctx) = seed_user(&db, Role::Manager).await;
    let product = seed_product(&db, 10).await;

    let updated = engine
        .adjust_stock(
            &ctx,
            &StockAdjustment {
                product_id: product.product_id,
                delta: 5,
                note: Some("cycle count surplus".to_string()),
            },
        )
        .await
        .expect("upward adjustment");
    assert_eq!(updated.stock_quantity, 15);

    let updated = engine
        .adjust_stock(
            &ctx,
            &StockAdjustment {
                product_id: product.product_id,
                delta: -15,
                note: None,
            },
        )
        .await
        .expect("downward adjustment");
    assert_eq!(updated.stock_quantity, 0);

    let err = engine
        .adjust_stock(
            &ctx,
            &StockAdjustment {
                product_id: product.product_id,
                delta: -1,
                note: None,
            },
        )
        .await
        .expect_err("below zero must fail");
    assert!(matches!(err, AppError::InsufficientStock(_)));
    assert_eq!(common::stock_of(&db, &product).await, 0);
}
