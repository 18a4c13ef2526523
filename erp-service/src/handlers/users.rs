//! User management handlers. Admin only; the permission table carries no
//! `users.*` keys for other roles.

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
use crate::models::{CreateUser, SanitizedUser, UpdateUser, UserFilter};
use crate::services::database::UserDeleteOutcome;
use crate::services::password::hash_password;
use crate::AppState;

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(filter): Query<UserFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<SanitizedUser>>, AppError> {
    ctx.authorize("users.view")?;

    let total = state.db.count_users(&filter).await?;
    let page = Page::compute(
        total,
        params.page_size_or(
            state.config.pagination.default_page_size,
            state.config.pagination.max_page_size,
        ),
        params.page_or_first(),
    );
    let users = state
        .db
        .list_users(&filter, &page)
        .await?
        .into_iter()
        .map(SanitizedUser::from)
        .collect();

    Ok(Json(ListResponse::new(users, page)))
}

/// GET /users/:user_id
pub async fn get_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<SanitizedUser>>, AppError> {
    ctx.authorize("users.view")?;

    let user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    Ok(Json(SuccessResponse::new(SanitizedUser::from(user))))
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<SuccessResponse<SanitizedUser>>), AppError> {
    ctx.authorize("users.create")?;
    input.validate()?;

    let password_hash = hash_password(&input.password)?;
    let user = state.db.create_user(&input, &password_hash).await?;
    let sanitized = SanitizedUser::from(user);

    state
        .audit
        .record(
            &ctx,
            "create",
            "users",
            Some(sanitized.user_id),
            None,
            serde_json::to_value(&sanitized).ok(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(sanitized))))
}

/// PUT /users/:user_id
pub async fn update_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<Uuid>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<SuccessResponse<SanitizedUser>>, AppError> {
    ctx.authorize("users.edit")?;
    input.validate()?;

    let old = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    let password_hash = match &input.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let user = state
        .db
        .update_user(user_id, &input, password_hash.as_deref())
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;
    let sanitized = SanitizedUser::from(user);

    state
        .audit
        .record(
            &ctx,
            "update",
            "users",
            Some(user_id),
            serde_json::to_value(SanitizedUser::from(old)).ok(),
            serde_json::to_value(&sanitized).ok(),
        )
        .await;

    Ok(Json(SuccessResponse::new(sanitized)))
}

/// DELETE /users/:user_id
///
/// A user with order history is deactivated instead of deleted.
pub async fn delete_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ctx.authorize("users.delete")?;

    if user_id == ctx.user_id {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "cannot delete your own account"
        )));
    }

    let old = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    let outcome = state.db.delete_user(user_id).await?;

    state
        .audit
        .record(
            &ctx,
            "delete",
            "users",
            Some(user_id),
            serde_json::to_value(SanitizedUser::from(old)).ok(),
            None,
        )
        .await;

    let message = match outcome {
        UserDeleteOutcome::Deleted => "User deleted",
        UserDeleteOutcome::Deactivated => "User has order history and was deactivated",
    };

    Ok(Json(MessageResponse::new(message)))
}
