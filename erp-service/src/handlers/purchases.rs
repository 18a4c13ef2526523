//! Purchase order handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use erp_core::context::RequestContext;
use erp_core::error::AppError;
use erp_core::pagination::{Page, PageParams};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{ListResponse, MessageResponse, SuccessResponse};
use crate::models::{
    CreatePurchaseOrder, PurchaseOrder, PurchaseOrderFilter, PurchaseOrderItem,
    PurchaseOrderStatus, UpdatePurchaseOrder,
};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub items: Vec<PurchaseOrderItem>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: PurchaseOrderStatus,
}

/// GET /purchase-orders
pub async fn list_orders(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(filter): Query<PurchaseOrderFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<PurchaseOrder>>, AppError> {
    ctx.authorize("purchases.view")?;

    let total = state.db.count_purchase_orders(&filter).await?;
    let page = Page::compute(
        total,
        params.page_size_or(
            state.config.pagination.default_page_size,
            state.config.pagination.max_page_size,
        ),
        params.page_or_first(),
    );
    let orders = state.db.list_purchase_orders(&filter, &page).await?;

    Ok(Json(ListResponse::new(orders, page)))
}

/// GET /purchase-orders/:purchase_order_id
pub async fn get_order(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(purchase_order_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<PurchaseOrderDetail>>, AppError> {
    ctx.authorize("purchases.view")?;

    let order = state
        .db
        .get_purchase_order(purchase_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Purchase order not found")))?;
    let items = state.db.list_purchase_order_items(purchase_order_id).await?;

    Ok(Json(SuccessResponse::new(PurchaseOrderDetail {
        order,
        items,
    })))
}

/// POST /purchase-orders
pub async fn create_order(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<CreatePurchaseOrder>,
) -> Result<(StatusCode, Json<SuccessResponse<PurchaseOrder>>), AppError> {
    ctx.authorize("purchases.create")?;
    input.validate()?;

    let order = state.db.create_purchase_order(ctx.user_id, &input).await?;

    state
        .audit
        .record(
            &ctx,
            "create",
            "purchase_orders",
            Some(order.purchase_order_id),
            None,
            serde_json::to_value(&order).ok(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(order))))
}

/// PUT /purchase-orders/:purchase_order_id
pub async fn update_order(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(purchase_order_id): Path<Uuid>,
    Json(input): Json<UpdatePurchaseOrder>,
) -> Result<Json<SuccessResponse<PurchaseOrder>>, AppError> {
    ctx.authorize("purchases.edit")?;

    let old = state
        .db
        .get_purchase_order(purchase_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Purchase order not found")))?;

    let order = state
        .db
        .update_purchase_order(purchase_order_id, &input)
        .await?;

    state
        .audit
        .record(
            &ctx,
            "update",
            "purchase_orders",
            Some(purchase_order_id),
            serde_json::to_value(&old).ok(),
            serde_json::to_value(&order).ok(),
        )
        .await;

    Ok(Json(SuccessResponse::new(order)))
}

/// Transition a purchase order's status; entering `received` adds stock.
///
/// POST /purchase-orders/:purchase_order_id/status
pub async fn update_order_status(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(purchase_order_id): Path<Uuid>,
    Json(input): Json<UpdateStatusRequest>,
) -> Result<Json<SuccessResponse<PurchaseOrder>>, AppError> {
    ctx.authorize("purchases.update_status")?;

    let old = state
        .db
        .get_purchase_order(purchase_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Purchase order not found")))?;

    let order = state
        .lifecycle
        .update_purchase_order_status(&ctx, purchase_order_id, input.status)
        .await?;

    state
        .audit
        .record(
            &ctx,
            "update_status",
            "purchase_orders",
            Some(purchase_order_id),
            serde_json::to_value(&old).ok(),
            serde_json::to_value(&order).ok(),
        )
        .await;

    Ok(Json(SuccessResponse::new(order)))
}

/// DELETE /purchase-orders/:purchase_order_id
pub async fn delete_order(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(purchase_order_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ctx.authorize("purchases.delete")?;

    let old = state
        .db
        .get_purchase_order(purchase_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Purchase order not found")))?;

    state.db.delete_purchase_order(purchase_order_id).await?;

    state
        .audit
        .record(
            &ctx,
            "delete",
            "purchase_orders",
            Some(purchase_order_id),
            serde_json::to_value(&old).ok(),
            None,
        )
        .await;

    Ok(Json(MessageResponse::new("Purchase order deleted")))
}
