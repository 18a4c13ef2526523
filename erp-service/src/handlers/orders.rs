//! Sales order handlers.

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
    CreateSalesOrder, SalesOrder, SalesOrderFilter, SalesOrderItem, SalesOrderStatus,
    UpdateSalesOrder,
};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SalesOrderDetail {
    #[serde(flatten)]
    pub order: SalesOrder,
    pub items: Vec<SalesOrderItem>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: SalesOrderStatus,
}

/// GET /sales-orders
pub async fn list_orders(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(filter): Query<SalesOrderFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<SalesOrder>>, AppError> {
    ctx.authorize("sales.view")?;

    let total = state.db.count_sales_orders(&filter).await?;
    let page = Page::compute(
        total,
        params.page_size_or(
            state.config.pagination.default_page_size,
            state.config.pagination.max_page_size,
        ),
        params.page_or_first(),
    );
    let orders = state.db.list_sales_orders(&filter, &page).await?;

    Ok(Json(ListResponse::new(orders, page)))
}

/// GET /sales-orders/:sales_order_id
pub async fn get_order(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(sales_order_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<SalesOrderDetail>>, AppError> {
    ctx.authorize("sales.view")?;

    let order = state
        .db
        .get_sales_order(sales_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Sales order not found")))?;
    let items = state.db.list_sales_order_items(sales_order_id).await?;

    Ok(Json(SuccessResponse::new(SalesOrderDetail { order, items })))
}

/// POST /sales-orders
pub async fn create_order(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<CreateSalesOrder>,
) -> Result<(StatusCode, Json<SuccessResponse<SalesOrder>>), AppError> {
    ctx.authorize("sales.create")?;
    input.validate()?;

    let order = state.db.create_sales_order(ctx.user_id, &input).await?;

    state
        .audit
        .record(
            &ctx,
            "create",
            "sales_orders",
            Some(order.sales_order_id),
            None,
            serde_json::to_value(&order).ok(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(order))))
}

/// PUT /sales-orders/:sales_order_id
pub async fn update_order(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(sales_order_id): Path<Uuid>,
    Json(input): Json<UpdateSalesOrder>,
) -> Result<Json<SuccessResponse<SalesOrder>>, AppError> {
    ctx.authorize("sales.edit")?;

    let old = state
        .db
        .get_sales_order(sales_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Sales order not found")))?;

    let order = state.db.update_sales_order(sales_order_id, &input).await?;

    state
        .audit
        .record(
            &ctx,
            "update",
            "sales_orders",
            Some(sales_order_id),
            serde_json::to_value(&old).ok(),
            serde_json::to_value(&order).ok(),
        )
        .await;

    Ok(Json(SuccessResponse::new(order)))
}

/// Transition a sales order's status, moving stock as required.
///
/// POST /sales-orders/:sales_order_id/status
pub async fn update_order_status(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(sales_order_id): Path<Uuid>,
    Json(input): Json<UpdateStatusRequest>,
) -> Result<Json<SuccessResponse<SalesOrder>>, AppError> {
    ctx.authorize("sales.update_status")?;

    let old = state
        .db
        .get_sales_order(sales_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Sales order not found")))?;

    let order = state
        .lifecycle
        .update_sales_order_status(&ctx, sales_order_id, input.status)
        .await?;

    state
        .audit
        .record(
            &ctx,
            "update_status",
            "sales_orders",
            Some(sales_order_id),
            serde_json::to_value(&old).ok(),
            serde_json::to_value(&order).ok(),
        )
        .await;

    Ok(Json(SuccessResponse::new(order)))
}

/// DELETE /sales-orders/:sales_order_id
pub async fn delete_order(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(sales_order_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ctx.authorize("sales.delete")?;

    let old = state
        .db
        .get_sales_order(sales_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Sales order not found")))?;

    state.db.delete_sales_order(sales_order_id).await?;

    state
        .audit
        .record(
            &ctx,
            "delete",
            "sales_orders",
            Some(sales_order_id),
            serde_json::to_value(&old).ok(),
            None,
        )
        .await;

    Ok(Json(MessageResponse::new("Sales order deleted")))
}
