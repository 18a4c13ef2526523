//! Sales and purchase order lifecycle integration tests: status
//! transitions coupled with stock movements.

mod common;

use common::{lifecycle, seed_customer, seed_product, seed_sales_order, seed_user, stock_of};
use erp_core::authz::Role;
use erp_core::error::AppError;
use erp_service::models::{
    CreatePurchaseItem, CreatePurchaseOrder, PurchaseOrderStatus, SalesOrderStatus,
    StockMovementFilter,
};
use erp_core::pagination::Page;

#[tokio::test]
async fn confirm_then_cancel_round_trips_stock() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let engine = lifecycle(&db);
    let (_, ctx) = seed_user(&db, Role::Manager).await;
    let product = seed_product(&db, 10).await;
    let customer = seed_customer(&db).await;
    let order = seed_sales_order(&db, &ctx, &customer, &[(&product, 3)]).await;

    // Confirm: stock drops and an outbound sale movement appears.
    let confirmed = engine
        .update_sales_order_status(&ctx, order.sales_order_id, SalesOrderStatus::Confirmed)
        .await
        .expect("confirm order");
    assert_eq!(confirmed.status, "confirmed");
    assert_eq!(stock_of(&db, &product).await, 7);

    let filter = StockMovementFilter {
        product_id: Some(product.product_id),
        ..Default::default()
    };
    let movements = db
        .list_stock_movements(&filter, &Page::compute(100, 100, 1))
        .await
        .expect("list movements");
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, "out");
    assert_eq!(movements[0].reference_type, "sale");
    assert_eq!(movements[0].quantity, 3);

    // Cancel: stock comes back via a return movement.
    let cancelled = engine
        .update_sales_order_status(&ctx, order.sales_order_id, SalesOrderStatus::Cancelled)
        .await
        .expect("cancel order");
    assert_eq!(cancelled.status, "cancelled");
    assert_eq!(stock_of(&db, &product).await, 10);

    let movements = db
        .list_stock_movements(&filter, &Page::compute(100, 100, 1))
        .await
        .expect("list movements");
    assert_eq!(movements.len(), 2);
    assert!(movements
        .iter()
        .any(|m| m.movement_type == "in" && m.reference_type == "return" && m.quantity == 3));
}

#[tokio::test]
async fn insufficient_stock_aborts_the_whole_transition() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let engine = lifecycle(&db);
    let (_, ctx) = seed_user(&db, Role::Manager).await;
    let plenty = seed_product(&db, 50).await;
    let scarce = seed_product(&db, 2).await;
    let customer = seed_customer(&db).await;
    let order = seed_sales_order(&db, &ctx, &customer, &[(&plenty, 10), (&scarce, 5)]).await;

    let err = engine
        .update_sales_order_status(&ctx, order.sales_order_id, SalesOrderStatus::Confirmed)
        .await
        .expect_err("confirmation must fail");
    assert!(matches!(err, AppError::InsufficientStock(_)));

    // Nothing moved: both stocks, the order status, and the ledger are
    // untouched.
    assert_eq!(stock_of(&db, &plenty).await, 50);
    assert_eq!(stock_of(&db, &scarce).await, 2);
    let order = db
        .get_sales_order(order.sales_order_id)
        .await
        .expect("get order")
        .expect("order exists");
    assert_eq!(order.status, "pending");

    for product in [&plenty, &scarce] {
        let filter = StockMovementFilter {
            product_id: Some(product.product_id),
            ..Default::default()
        };
        assert_eq!(
            db.count_stock_movements(&filter).await.expect("count"),
            0,
            "no movement rows may exist after an aborted transition"
        );
    }
}

#[tokio::test]
async fn illegal_transitions_are_rejected() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let engine = lifecycle(&db);
    let (_, ctx) = seed_user(&db, Role::Manager).await;
    let product = seed_product(&db, 10).await;
    let customer = seed_customer(&db).await;
    let order = seed_sales_order(&db, &ctx, &customer, &[(&product, 1)]).await;

    // pending -> delivered skips the machine.
    let err = engine
        .update_sales_order_status(&ctx, order.sales_order_id, SalesOrderStatus::Delivered)
        .await
        .expect_err("must reject");
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(stock_of(&db, &product).await, 10);

    // Submitting the current status again is a harmless no-op.
    let unchanged = engine
        .update_sales_order_status(&ctx, order.sales_order_id, SalesOrderStatus::Pending)
        .await
        .expect("no-op");
    assert_eq!(unchanged.status, "pending");
}

#[tokio::test]
async fn confirmed_to_shipped_is_status_only() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let engine = lifecycle(&db);
    let (_, ctx) = seed_user(&db, Role::Manager).await;
    let product = seed_product(&db, 10).await;
    let customer = seed_customer(&db).await;
    let order = seed_sales_order(&db, &ctx, &customer, &[(&product, 4)]).await;

    engine
        .update_sales_order_status(&ctx, order.sales_order_id, SalesOrderStatus::Confirmed)
        .await
        .expect("confirm");
    assert_eq!(stock_of(&db, &product).await, 6);

    engine
        .update_sales_order_status(&ctx, order.sales_order_id, SalesOrderStatus::Shipped)
        .await
        .expect("ship");
    engine
        .update_sales_order_status(&ctx, order.sales_order_id, SalesOrderStatus::Delivered)
        .await
        .expect("deliver");

    // The decrement happened once, on confirmation.
    assert_eq!(stock_of(&db, &product).await, 6);
    let filter = StockMovementFilter {
        product_id: Some(product.product_id),
        ..Default::default()
    };
    assert_eq!(db.count_stock_movements(&filter).await.expect("count"), 1);
}

#[tokio::test]
async fn purchase_receipt_adds_stock_once() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let engine = lifecycle(&db);
    let (_, ctx) = seed_user(&db, Role::Manager).await;
    let product = seed_product(&db, 10).await;
    let supplier = common::seed_supplier(&db).await;

    let order = db
        .create_purchase_order(
            ctx.user_id,
            &CreatePurchaseOrder {
                supplier_id: supplier.supplier_id,
                order_date: common::order_date(),
                items: vec![CreatePurchaseItem {
                    product_id: product.product_id,
                    quantity: 25,
                    unit_price: common::amount(500),
                }],
                tax_amount: None,
                discount_amount: None,
                notes: None,
            },
        )
        .await
        .expect("create purchase order");

    for status in [
        PurchaseOrderStatus::Approved,
        PurchaseOrderStatus::Ordered,
        PurchaseOrderStatus::Received,
    ] {
        engine
            .update_purchase_order_status(&ctx, order.purchase_order_id, status)
            .await
            .expect("advance purchase order");
    }
    assert_eq!(stock_of(&db, &product).await, 35);

    // A duplicated receive submission is a no-op for stock.
    let again = engine
        .update_purchase_order_status(
            &ctx,
            order.purchase_order_id,
            PurchaseOrderStatus::Received,
        )
        .await
        .expect("duplicate receive is a no-op");
    assert_eq!(again.status, "received");
    assert_eq!(stock_of(&db, &product).await, 35);

    let filter = StockMovementFilter {
        product_id: Some(product.product_id),
        ..Default::default()
    };
    let movements = db
        .list_stock_movements(&filter, &Page::compute(100, 100, 1))
        .await
        .expect("list movements");
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, "in");
    assert_eq!(movements[0].reference_type, "purchase");
    assert_eq!(movements[0].quantity, 25);
}

#[tokio::test]
async fn stock_equals_initial_plus_movement_ledger() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let engine = lifecycle(&db);
    let (_, ctx) = seed_user(&db, Role::Manager).await;
    let product = seed_product(&db, 20).await;
    let customer = seed_customer(&db).await;

    // Two orders commit stock; one of them is cancelled again.
    let first = seed_sales_order(&db, &ctx, &customer, &[(&product, 5)]).await;
    let second = seed_sales_order(&db, &ctx, &customer, &[(&product, 7)]).await;
    engine
        .update_sales_order_status(&ctx, first.sales_order_id, SalesOrderStatus::Confirmed)
        .await
        .expect("confirm first");
    engine
        .update_sales_order_status(&ctx, second.sales_order_id, SalesOrderStatus::Confirmed)
        .await
        .expect("confirm second");
    engine
        .update_sales_order_status(&ctx, second.sales_order_id, SalesOrderStatus::Cancelled)
        .await
        .expect("cancel second");

    let (ins, outs) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT COALESCE(SUM(quantity) FILTER (WHERE movement_type = 'in'), 0),
               COALESCE(SUM(quantity) FILTER (WHERE movement_type = 'out'), 0)
        FROM stock_movements
        WHERE product_id = $1
        "#,
    )
    .bind(product.product_id)
    .fetch_one(db.pool())
    .await
    .expect("sum movements");

    let stock = stock_of(&db, &product).await;
    assert_eq!(stock as i64, 20 + ins - outs);
    assert_eq!(stock, 15);
}
