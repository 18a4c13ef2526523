//! Customer handlers.

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
use crate::models::{CreateCustomer, Customer, CustomerFilter, CustomerWithStats, UpdateCustomer};
use crate::AppState;

/// GET /customers
pub async fn list_customers(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(filter): Query<CustomerFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<CustomerWithStats>>, AppError> {
    ctx.authorize("customers.view")?;

    let total = state.db.count_customers(&filter).await?;
    let page = Page::compute(
        total,
        params.page_size_or(
            state.config.pagination.default_page_size,
            state.config.pagination.max_page_size,
        ),
        params.page_or_first(),
    );
    let customers = state.db.list_customers(&filter, &page).await?;

    Ok(Json(ListResponse::new(customers, page)))
}

/// GET /customers/:customer_id
pub async fn get_customer(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<CustomerWithStats>>, AppError> {
    ctx.authorize("customers.view")?;

    let customer = state
        .db
        .get_customer(customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;

    Ok(Json(SuccessResponse::new(customer)))
}

/// POST /customers
pub async fn create_customer(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<CreateCustomer>,
) -> Result<(StatusCode, Json<SuccessResponse<Customer>>), AppError> {
    ctx.authorize("customers.create")?;
    input.validate()?;

    let customer = state.db.create_customer(&input).await?;

    state
        .audit
        .record(
            &ctx,
            "create",
            "customers",
            Some(customer.customer_id),
            None,
            serde_json::to_value(&customer).ok(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(customer))))
}

/// PUT /customers/:customer_id
pub async fn update_customer(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(customer_id): Path<Uuid>,
    Json(input): Json<UpdateCustomer>,
) -> Result<Json<SuccessResponse<Customer>>, AppError> {
    ctx.authorize("customers.edit")?;
    input.validate()?;

    let old = state
        .db
        .get_customer(customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;

    let customer = state
        .db
        .update_customer(customer_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;

    state
        .audit
        .record(
            &ctx,
            "update",
            "customers",
            Some(customer_id),
            serde_json::to_value(&old).ok(),
            serde_json::to_value(&customer).ok(),
        )
        .await;

    Ok(Json(SuccessResponse::new(customer)))
}

/// DELETE /customers/:customer_id
pub async fn delete_customer(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ctx.authorize("customers.delete")?;

    let old = state
        .db
        .get_customer(customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;

    state.db.delete_customer(customer_id).await?;

    state
        .audit
        .record(
            &ctx,
            "delete",
            "customers",
            Some(customer_id),
            serde_json::to_value(&old).ok(),
            None,
        )
        .await;

    Ok(Json(MessageResponse::new("Customer deleted")))
}
