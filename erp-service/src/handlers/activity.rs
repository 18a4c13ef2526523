//! Activity log handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use erp_core::context::RequestContext;
use erp_core::error::AppError;
use erp_core::pagination::{Page, PageParams};

use super::ListResponse;
use crate::models::{ActivityFilter, ActivityLog};
use crate::AppState;

/// GET /activity
pub async fn list_activity(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(filter): Query<ActivityFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<ActivityLog>>, AppError> {
    ctx.authorize("activity.view")?;

    let total = state.db.count_activity(&filter).await?;
    let page = Page::compute(
        total,
        params.page_size_or(
            state.config.pagination.default_page_size,
            state.config.pagination.max_page_size,
        ),
        params.page_or_first(),
    );
    let entries = state.db.list_activity(&filter, &page).await?;

    Ok(Json(ListResponse::new(entries, page)))
}
