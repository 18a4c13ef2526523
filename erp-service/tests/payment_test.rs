//! Payment application integration tests: invoice status follows the sum
//! of completed payments and never reverts from paid.

mod common;

use common::{amount, lifecycle, seed_customer, seed_product, seed_sales_order, seed_user};
use chrono::NaiveDate;
use erp_core::authz::Role;
use erp_core::error::AppError;
use erp_service::models::{CreatePayment, GenerateInvoice, Invoice, SalesOrderStatus};
use erp_service::services::{Database, Lifecycle};
use erp_core::context::RequestContext;
use rust_decimal::Decimal;

fn payment(amount: Decimal) -> CreatePayment {
    CreatePayment {
        amount,
        payment_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        payment_method: "bank_transfer".to_string(),
        reference: None,
        status: None,
    }
}

/// Seed a confirmed, invoiced order and return the invoice.
async fn seed_invoice(db: &Database, engine: &Lifecycle, ctx: &RequestContext) -> Invoice {
    let product = seed_product(db, 100).await;
    let customer = seed_customer(db).await;
    let order = seed_sales_order(db, ctx, &customer, &[(&product, 10)]).await;
    engine
        .update_sales_order_status(ctx, order.sales_order_id, SalesOrderStatus::Confirmed)
        .await
        .expect("confirm order");
    engine
        .generate_invoice(
            ctx,
            &GenerateInvoice {
                sales_order_id: order.sales_order_id,
                due_date: NaiveDate::from_ymd_opt(2027, 12, 31).unwrap(),
            },
        )
        .await
        .expect("generate invoice")
}

#[tokio::test]
async fn partial_then_full_payment_progression() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let engine = lifecycle(&db);
    let (_, ctx) = seed_user(&db, Role::Manager).await;
    let invoice = seed_invoice(&db, &engine, &ctx).await;
    // 10 × 9.99
    assert_eq!(invoice.total_amount, amount(9990));

    let (_, invoice) = engine
        .record_payment(&ctx, invoice.invoice_id, &payment(amount(4000)))
        .await
        .expect("partial payment");
    assert_eq!(invoice.status, "partial");

    let (_, invoice) = engine
        .record_payment(&ctx, invoice.invoice_id, &payment(amount(5990)))
        .await
        .expect("settling payment");
    assert_eq!(invoice.status, "paid");
}

#[tokio::test]
async fn exact_payment_settles_immediately() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let engine = lifecycle(&db);
    let (_, ctx) = seed_user(&db, Role::Manager).await;
    let invoice = seed_invoice(&db, &engine, &ctx).await;

    let (_, invoice) = engine
        .record_payment(&ctx, invoice.invoice_id, &payment(invoice.total_amount))
        .await
        .expect("full payment");
    assert_eq!(invoice.status, "paid");
}

#[tokio::test]
async fn paid_status_is_monotonic() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let engine = lifecycle(&db);
    let (_, ctx) = seed_user(&db, Role::Manager).await;
    let invoice = seed_invoice(&db, &engine, &ctx).await;

    let (_, invoice) = engine
        .record_payment(&ctx, invoice.invoice_id, &payment(invoice.total_amount))
        .await
        .expect("full payment");
    assert_eq!(invoice.status, "paid");

    // An extra payment on a settled invoice must not demote it.
    let (_, invoice) = engine
        .record_payment(&ctx, invoice.invoice_id, &payment(amount(100)))
        .await
        .expect("overpayment");
    assert_eq!(invoice.status, "paid");
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let engine = lifecycle(&db);
    let (_, ctx) = seed_user(&db, Role::Manager).await;
    let invoice = seed_invoice(&db, &engine, &ctx).await;

    let err = engine
        .record_payment(&ctx, invoice.invoice_id, &payment(Decimal::ZERO))
        .await
        .expect_err("zero amount must fail");
    assert!(matches!(err, AppError::BadRequest(_)));

    let invoice = db
        .get_invoice(invoice.invoice_id)
        .await
        .expect("get invoice")
        .expect("invoice exists");
    assert_eq!(invoice.status, "draft");
}

#[tokio::test]
async fn cancelled_invoices_reject_payments() {
    let Some(db) = common::test_db().await else {
        return;
    };
    let engine = lifecycle(&db);
    let (_, ctx) = seed_user(&db, Role::Manager).await;
    let invoice = seed_invoice(&db, &engine, &ctx).await;

    db.cancel_invoice(invoice.invoice_id)
        .await
        .expect("cancel invoice");

    let err = engine
        .record_payment(&ctx, invoice.invoice_id, &payment(amount(1000)))
        .await
        .expect_err("payment against cancelled invoice must fail");
    assert!(matches!(err, AppError::Conflict(_)));
}
