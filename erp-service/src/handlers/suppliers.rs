//! Supplier handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use erp_core::context::RequestContext;
use erp_core::error::AppError;
use erp_core::pagination::{Page, PageParams};
use uuid::Uuid;
use validator::Validate;

use super::{ListResponse, MessageResponse, SuccessResponse};
use crate::models::{CreateSupplier, Supplier, SupplierFilter, SupplierWithStats, UpdateSupplier};
use crate::AppState;

/// GET /suppliers
pub async fn list_suppliers(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(filter): Query<SupplierFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<SupplierWithStats>>, AppError> {
    ctx.authorize("suppliers.view")?;

    let total = state.db.count_suppliers(&filter).await?;
    let page = Page::compute(
        total,
        params.page_size_or(
            state.config.pagination.default_page_size,
            state.config.pagination.max_page_size,
        ),
        params.page_or_first(),
    );
    let suppliers = state.db.list_suppliers(&filter, &page).await?;

    Ok(Json(ListResponse::new(suppliers, page)))
}

/// GET /suppliers/:supplier_id
pub async fn get_supplier(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(supplier_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<SupplierWithStats>>, AppError> {
    ctx.authorize("suppliers.view")?;

    let supplier = state
        .db
        .get_supplier(supplier_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Supplier not found")))?;

    Ok(Json(SuccessResponse::new(supplier)))
}

/// POST /suppliers
pub async fn create_supplier(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<CreateSupplier>,
) -> Result<(StatusCode, Json<SuccessResponse<Supplier>>), AppError> {
    ctx.authorize("suppliers.create")?;
    input.validate()?;

    let supplier = state.db.create_supplier(&input).await?;

    state
        .audit
        .record(
            &ctx,
            "create",
            "suppliers",
            Some(supplier.supplier_id),
            None,
            serde_json::to_value(&supplier).ok(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(supplier))))
}

/// PUT /suppliers/:supplier_id
pub async fn update_supplier(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(supplier_id): Path<Uuid>,
    Json(input): Json<UpdateSupplier>,
) -> Result<Json<SuccessResponse<Supplier>>, AppError> {
    ctx.authorize("suppliers.edit")?;
    input.validate()?;

    let old = state
        .db
        .get_supplier(supplier_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Supplier not found")))?;

    let supplier = state
        .db
        .update_supplier(supplier_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Supplier not found")))?;

    state
        .audit
        .record(
            &ctx,
            "update",
            "suppliers",
            Some(supplier_id),
            serde_json::to_value(&old).ok(),
            serde_json::to_value(&supplier).ok(),
        )
        .await;

    Ok(Json(SuccessResponse::new(supplier)))
}

/// DELETE /suppliers/:supplier_id
pub async fn delete_supplier(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(supplier_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ctx.authorize("suppliers.delete")?;

    let old = state
        .db
        .get_supplier(supplier_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Supplier not found")))?;

    state.db.delete_supplier(supplier_id).await?;

    state
        .audit
        .record(
            &ctx,
            "delete",
            "suppliers",
            Some(supplier_id),
            serde_json::to_value(&old).ok(),
            None,
        )
        .await;

    Ok(Json(MessageResponse::new("Supplier deleted")))
}
