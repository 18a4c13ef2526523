//! Stock handlers: manual adjustments and the movement ledger.

use axum::{
    extract::{Query, State},
    Json,
};
use erp_core::context::RequestContext;
use erp_core::error::AppError;
use erp_core::pagination::{Page, PageParams};
use validator::Validate;

use super::{ListResponse, SuccessResponse};
use crate::models::{Product, StockAdjustment, StockMovement, StockMovementFilter};
use crate::AppState;

/// List stock movements.
///
/// GET /stock/movements
pub async fn list_movements(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(filter): Query<StockMovementFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<StockMovement>>, AppError> {
    ctx.authorize("stock.view")?;

    let total = state.db.count_stock_movements(&filter).await?;
    let page = Page::compute(
        total,
        params.page_size_or(
            state.config.pagination.default_page_size,
            state.config.pagination.max_page_size,
        ),
        params.page_or_first(),
    );
    let movements = state.db.list_stock_movements(&filter, &page).await?;

    Ok(Json(ListResponse::new(movements, page)))
}

/// Apply a manual stock adjustment.
///
/// POST /stock/adjust
pub async fn adjust_stock(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<StockAdjustment>,
) -> Result<Json<SuccessResponse<Product>>, AppError> {
    ctx.authorize("stock.adjust")?;
    input.validate()?;

    let product = state.lifecycle.adjust_stock(&ctx, &input).await?;

    state
        .audit
        .record(
            &ctx,
            "adjust_stock",
            "products",
            Some(product.product_id),
            None,
            serde_json::to_value(&product).ok(),
        )
        .await;

    Ok(Json(SuccessResponse::new(product)))
}
