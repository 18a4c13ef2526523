//! Invoice and payment handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use erp_core::context::RequestContext;
use erp_core::error::AppError;
use erp_core::pagination::{Page, PageParams};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use super::{ListResponse, MessageResponse, SuccessResponse};
use crate::models::{
    CreatePayment, GenerateInvoice, Invoice, InvoiceFilter, InvoiceItem, Payment,
};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Serialize)]
pub struct PaymentRecorded {
    pub success: bool,
    pub payment: Payment,
    pub invoice: Invoice,
}

/// GET /invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(filter): Query<InvoiceFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<Invoice>>, AppError> {
    ctx.authorize("invoices.view")?;

    let total = state.db.count_invoices(&filter).await?;
    let page = Page::compute(
        total,
        params.page_size_or(
            state.config.pagination.default_page_size,
            state.config.pagination.max_page_size,
        ),
        params.page_or_first(),
    );
    let invoices = state.db.list_invoices(&filter, &page).await?;

    Ok(Json(ListResponse::new(invoices, page)))
}

/// GET /invoices/:invoice_id
pub async fn get_invoice(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<InvoiceDetail>>, AppError> {
    ctx.authorize("invoices.view")?;

    let invoice = state
        .db
        .get_invoice(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
    let items = state.db.list_invoice_items(invoice_id).await?;
    let payments = state.db.list_payments(invoice_id).await?;

    Ok(Json(SuccessResponse::new(InvoiceDetail {
        invoice,
        items,
        payments,
    })))
}

/// Generate an invoice from a sales order.
///
/// POST /invoices/generate
pub async fn generate_invoice(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<GenerateInvoice>,
) -> Result<(StatusCode, Json<SuccessResponse<Invoice>>), AppError> {
    ctx.authorize("invoices.create")?;

    let invoice = state.lifecycle.generate_invoice(&ctx, &input).await?;

    state
        .audit
        .record(
            &ctx,
            "generate_invoice",
            "invoices",
            Some(invoice.invoice_id),
            None,
            serde_json::to_value(&invoice).ok(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(invoice))))
}

/// Mark a draft invoice as sent.
///
/// POST /invoices/:invoice_id/send
pub async fn send_invoice(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<Invoice>>, AppError> {
    ctx.authorize("invoices.edit")?;

    let old = state
        .db
        .get_invoice(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    let invoice = state.db.mark_invoice_sent(invoice_id).await?;

    state
        .audit
        .record(
            &ctx,
            "send_invoice",
            "invoices",
            Some(invoice_id),
            serde_json::to_value(&old).ok(),
            serde_json::to_value(&invoice).ok(),
        )
        .await;

    Ok(Json(SuccessResponse::new(invoice)))
}

/// Cancel an invoice.
///
/// POST /invoices/:invoice_id/cancel
pub async fn cancel_invoice(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<Invoice>>, AppError> {
    ctx.authorize("invoices.edit")?;

    let old = state
        .db
        .get_invoice(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    let invoice = state.db.cancel_invoice(invoice_id).await?;

    state
        .audit
        .record(
            &ctx,
            "cancel_invoice",
            "invoices",
            Some(invoice_id),
            serde_json::to_value(&old).ok(),
            serde_json::to_value(&invoice).ok(),
        )
        .await;

    Ok(Json(SuccessResponse::new(invoice)))
}

/// Record a payment against an invoice.
///
/// POST /invoices/:invoice_id/payments
pub async fn record_payment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(invoice_id): Path<Uuid>,
    Json(input): Json<CreatePayment>,
) -> Result<(StatusCode, Json<PaymentRecorded>), AppError> {
    ctx.authorize("payments.create")?;
    input.validate()?;

    let (payment, invoice) = state
        .lifecycle
        .record_payment(&ctx, invoice_id, &input)
        .await?;

    state
        .audit
        .record(
            &ctx,
            "record_payment",
            "payments",
            Some(payment.payment_id),
            None,
            serde_json::to_value(&payment).ok(),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(PaymentRecorded {
            success: true,
            payment,
            invoice,
        }),
    ))
}

/// Sweep invoices past their due date into `overdue`.
///
/// POST /invoices/mark-overdue
pub async fn mark_overdue(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<MessageResponse>, AppError> {
    ctx.authorize("invoices.edit")?;

    let today = chrono::Utc::now().date_naive();
    let count = state.db.mark_invoices_overdue(today).await?;

    Ok(Json(MessageResponse::new(format!(
        "{} invoice(s) marked overdue",
        count
    ))))
}

/// DELETE /invoices/:invoice_id
pub async fn delete_invoice(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ctx.authorize("invoices.delete")?;

    let old = state
        .db
        .get_invoice(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    state.db.delete_invoice(invoice_id).await?;

    state
        .audit
        .record(
            &ctx,
            "delete",
            "invoices",
            Some(invoice_id),
            serde_json::to_value(&old).ok(),
            None,
        )
        .await;

    Ok(Json(MessageResponse::new("Invoice deleted")))
}
