//! Category handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use erp_core::context::RequestContext;
use erp_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use super::{MessageResponse, SuccessResponse};
use crate::models::{Category, CreateCategory, UpdateCategory};
use crate::AppState;

/// GET /categories
pub async fn list_categories(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<SuccessResponse<Vec<Category>>>, AppError> {
    ctx.authorize("categories.view")?;

    let categories = state.db.list_categories().await?;

    Ok(Json(SuccessResponse::new(categories)))
}

/// GET /categories/:category_id
pub async fn get_category(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(category_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<Category>>, AppError> {
    ctx.authorize("categories.view")?;

    let category = state
        .db
        .get_category(category_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Category not found")))?;

    Ok(Json(SuccessResponse::new(category)))
}

/// POST /categories
pub async fn create_category(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<CreateCategory>,
) -> Result<(StatusCode, Json<SuccessResponse<Category>>), AppError> {
    ctx.authorize("categories.create")?;
    input.validate()?;

    let category = state.db.create_category(&input).await?;

    state
        .audit
        .record(
            &ctx,
            "create",
            "categories",
            Some(category.category_id),
            None,
            serde_json::to_value(&category).ok(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(category))))
}

/// PUT /categories/:category_id
pub async fn update_category(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(category_id): Path<Uuid>,
    Json(input): Json<UpdateCategory>,
) -> Result<Json<SuccessResponse<Category>>, AppError> {
    ctx.authorize("categories.edit")?;
    input.validate()?;

    let old = state
        .db
        .get_category(category_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Category not found")))?;

    let category = state
        .db
        .update_category(category_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Category not found")))?;

    state
        .audit
        .record(
            &ctx,
            "update",
            "categories",
            Some(category_id),
            serde_json::to_value(&old).ok(),
            serde_json::to_value(&category).ok(),
        )
        .await;

    Ok(Json(SuccessResponse::new(category)))
}

/// DELETE /categories/:category_id
pub async fn delete_category(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(category_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ctx.authorize("categories.delete")?;

    let old = state
        .db
        .get_category(category_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Category not found")))?;

    state.db.delete_category(category_id).await?;

    state
        .audit
        .record(
            &ctx,
            "delete",
            "categories",
            Some(category_id),
            serde_json::to_value(&old).ok(),
            None,
        )
        .await;

    Ok(Json(MessageResponse::new("Category deleted")))
}
