//! Product handlers.

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
use crate::models::{CreateProduct, Product, ProductFilter, UpdateProduct};
use crate::AppState;

/// List products.
///
/// GET /products
pub async fn list_products(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(filter): Query<ProductFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<Product>>, AppError> {
    ctx.authorize("products.view")?;

    let total = state.db.count_products(&filter).await?;
    let page = Page::compute(
        total,
        params.page_size_or(
            state.config.pagination.default_page_size,
            state.config.pagination.max_page_size,
        ),
        params.page_or_first(),
    );
    let products = state.db.list_products(&filter, &page).await?;

    Ok(Json(ListResponse::new(products, page)))
}

/// Get a product by ID.
///
/// GET /products/:product_id
pub async fn get_product(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(product_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<Product>>, AppError> {
    ctx.authorize("products.view")?;

    let product = state
        .db
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    Ok(Json(SuccessResponse::new(product)))
}

/// Create a product.
///
/// POST /products
pub async fn create_product(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<CreateProduct>,
) -> Result<(StatusCode, Json<SuccessResponse<Product>>), AppError> {
    ctx.authorize("products.create")?;
    input.validate()?;

    let product = state.db.create_product(&input).await?;

    state
        .audit
        .record(
            &ctx,
            "create",
            "products",
            Some(product.product_id),
            None,
            serde_json::to_value(&product).ok(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(product))))
}

/// Update a product.
///
/// PUT /products/:product_id
pub async fn update_product(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProduct>,
) -> Result<Json<SuccessResponse<Product>>, AppError> {
    ctx.authorize("products.edit")?;
    input.validate()?;

    let old = state
        .db
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    let product = state
        .db
        .update_product(product_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    state
        .audit
        .record(
            &ctx,
            "update",
            "products",
            Some(product_id),
            serde_json::to_value(&old).ok(),
            serde_json::to_value(&product).ok(),
        )
        .await;

    Ok(Json(SuccessResponse::new(product)))
}

/// Delete a product.
///
/// DELETE /products/:product_id
pub async fn delete_product(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(product_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ctx.authorize("products.delete")?;

    let old = state
        .db
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    state.db.delete_product(product_id).await?;

    state
        .audit
        .record(
            &ctx,
            "delete",
            "products",
            Some(product_id),
            serde_json::to_value(&old).ok(),
            None,
        )
        .await;

    Ok(Json(MessageResponse::new("Product deleted")))
}
