//! Invoice generation integration tests.

mod common;

use common::{lifecycle, seed_customer, seed_product, seed_sales_order, seed_user};
use chrono::NaiveDate;
use erp_core::authz::Role;
use erp_core::error::AppError;
use erp_service::models::{GenerateInvoice, SalesOrderStatus};

fn due_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2027, 12, 31).unwrap()
}

#[tokio::test]
async fn invoice_copies_order_totals_and_items() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let engine = lifecycle(&db);
    let (_, ctx) = seed_user(&db, Role::Manager).await;
    let product = seed_product(&db, 10).await;
    let customer = seed_customer(&db).await;
    let order = seed_sales_order(&db, &ctx, &customer, &[(&product, 3)]).await;

    engine
        .update_sales_order_status(&ctx, order.sales_order_id, SalesOrderStatus::Confirmed)
        .await
        .expect("confirm order");

    let invoice = engine
        .generate_invoice(
            &ctx,
            &GenerateInvoice {
                sales_order_id: order.sales_order_id,
                due_date: due_date(),
            },
        )
        .await
        .expect("generate invoice");

    assert_eq!(invoice.status, "draft");
    assert_eq!(invoice.sales_order_id, Some(order.sales_order_id));
    assert_eq!(invoice.customer_id, customer.customer_id);
    assert_eq!(invoice.subtotal, order.subtotal);
    assert_eq!(invoice.total_amount, order.total_amount);
    assert!(invoice.invoice_number.starts_with("INV-"));

    let items = db
        .list_invoice_items(invoice.invoice_id)
        .await
        .expect("list items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, Some(product.product_id));
    assert_eq!(items[0].quantity, 3);
    assert_eq!(items[0].unit_price, product.unit_price);
    assert_eq!(items[0].description, product.name);
}

#[tokio::test]
async fn second_invoice_for_the_same_order_is_rejected() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let engine = lifecycle(&db);
    let (_, ctx) = seed_user(&db, Role::Manager).await;
    let product = seed_product(&db, 10).await;
    let customer = seed_customer(&db).await;
    let order = seed_sales_order(&db, &ctx, &customer, &[(&product, 2)]).await;

    engine
        .update_sales_order_status(&ctx, order.sales_order_id, SalesOrderStatus::Confirmed)
        .await
        .expect("confirm order");

    let input = GenerateInvoice {
        sales_order_id: order.sales_order_id,
        due_date: due_date(),
    };
    engine
        .generate_invoice(&ctx, &input)
        .await
        .expect("first invoice");

    let err = engine
        .generate_invoice(&ctx, &input)
        .await
        .expect_err("second invoice must fail");
    assert!(matches!(err, AppError::Conflict(_)));

    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM invoices WHERE sales_order_id = $1",
    )
    .bind(order.sales_order_id)
    .fetch_one(db.pool())
    .await
    .expect("count invoices");
    assert_eq!(count, 1);
}

#[tokio::test]
#[serial_test::serial]
async fn overdue_sweep_catches_sent_invoices_past_due() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let engine = lifecycle(&db);
    let (_, ctx) = seed_user(&db, Role::Manager).await;
    let product = seed_product(&db, 10).await;
    let customer = seed_customer(&db).await;
    let order = seed_sales_order(&db, &ctx, &customer, &[(&product, 1)]).await;

    engine
        .update_sales_order_status(&ctx, order.sales_order_id, SalesOrderStatus::Confirmed)
        .await
        .expect("confirm order");
    let invoice = engine
        .generate_invoice(
            &ctx,
            &GenerateInvoice {
                sales_order_id: order.sales_order_id,
                due_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            },
        )
        .await
        .expect("generate invoice");
    db.mark_invoice_sent(invoice.invoice_id)
        .await
        .expect("send invoice");

    let today = chrono::Utc::now().date_naive();
    db.mark_invoices_overdue(today).await.expect("sweep");

    let invoice = db
        .get_invoice(invoice.invoice_id)
        .await
        .expect("get invoice")
        .expect("invoice exists");
    assert_eq!(invoice.status, "overdue");

    // Draft invoices are never swept.
    let draft_order = seed_sales_order(&db, &ctx, &customer, &[(&product, 1)]).await;
    engine
        .update_sales_order_status(&ctx, draft_order.sales_order_id, SalesOrderStatus::Confirmed)
        .await
        .expect("confirm order");
    let draft = engine
        .generate_invoice(
            &ctx,
            &GenerateInvoice {
                sales_order_id: draft_order.sales_order_id,
                due_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            },
        )
        .await
        .expect("generate invoice");
    db.mark_invoices_overdue(today).await.expect("sweep");
    let draft = db
        .get_invoice(draft.invoice_id)
        .await
        .expect("get invoice")
        .expect("invoice exists");
    assert_eq!(draft.status, "draft");
}

#[tokio::test]
async fn pending_orders_cannot_be_invoiced() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let engine = lifecycle(&db);
    let (_, ctx) = seed_user(&db, Role::Manager).await;
    let product = seed_product(&db, 10).await;
    let customer = seed_customer(&db).await;
    let order = seed_sales_order(&db, &ctx, &customer, &[(&product, 2)]).await;

    let err = engine
        .generate_invoice(
            &ctx,
            &GenerateInvoice {
                sales_order_id: order.sales_order_id,
                due_date: due_date(),
            },
        )
        .await
        .expect_err("pending order must not be invoiceable");
    assert!(matches!(err, AppError::Conflict(_)));
}
