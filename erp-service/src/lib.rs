pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use erp_core::config::ErpConfig;
use erp_core::error::AppError;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::MessageResponse;
use crate::services::{AuditTrail, Database, Lifecycle};

#[derive(Clone)]
pub struct AppState {
    pub config: ErpConfig,
    pub db: Database,
    pub lifecycle: Lifecycle,
    pub audit: AuditTrail,
}

impl AppState {
    pub fn new(config: ErpConfig, db: Database) -> Self {
        let lifecycle = Lifecycle::new(db.clone());
        let audit = AuditTrail::new(db.clone());
        Self {
            config,
            db,
            lifecycle,
            audit,
        }
    }
}

/// Build the application router. Everything except health and metrics sits
/// behind the session middleware.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/products/:product_id",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route(
            "/categories",
            get(handlers::categories::list_categories).post(handlers::categories::create_category),
        )
        .route(
            "/categories/:category_id",
            get(handlers::categories::get_category)
                .put(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        )
        .route("/stock/movements", get(handlers::stock::list_movements))
        .route("/stock/adjust", post(handlers::stock::adjust_stock))
        .route(
            "/customers",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route(
            "/customers/:customer_id",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .route(
            "/suppliers",
            get(handlers::suppliers::list_suppliers).post(handlers::suppliers::create_supplier),
        )
        .route(
            "/suppliers/:supplier_id",
            get(handlers::suppliers::get_supplier)
                .put(handlers::suppliers::update_supplier)
                .delete(handlers::suppliers::delete_supplier),
        )
        .route(
            "/sales-orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route(
            "/sales-orders/:sales_order_id",
            get(handlers::orders::get_order)
                .put(handlers::orders::update_order)
                .delete(handlers::orders::delete_order),
        )
        .route(
            "/sales-orders/:sales_order_id/status",
            post(handlers::orders::update_order_status),
        )
        .route(
            "/purchase-orders",
            get(handlers::purchases::list_orders).post(handlers::purchases::create_order),
        )
        .route(
            "/purchase-orders/:purchase_order_id",
            get(handlers::purchases::get_order)
                .put(handlers::purchases::update_order)
                .delete(handlers::purchases::delete_order),
        )
        .route(
            "/purchase-orders/:purchase_order_id/status",
            post(handlers::purchases::update_order_status),
        )
        .route("/invoices", get(handlers::invoices::list_invoices))
        .route("/invoices/generate", post(handlers::invoices::generate_invoice))
        .route("/invoices/mark-overdue", post(handlers::invoices::mark_overdue))
        .route(
            "/invoices/:invoice_id",
            get(handlers::invoices::get_invoice).delete(handlers::invoices::delete_invoice),
        )
        .route("/invoices/:invoice_id/send", post(handlers::invoices::send_invoice))
        .route(
            "/invoices/:invoice_id/cancel",
            post(handlers::invoices::cancel_invoice),
        )
        .route(
            "/invoices/:invoice_id/payments",
            post(handlers::invoices::record_payment),
        )
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/:user_id",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/activity", get(handlers::activity::list_activity))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth::require_session,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Service health, including database reachability.
async fn health_check(State(state): State<AppState>) -> Result<Json<MessageResponse>, AppError> {
    state.db.health_check().await?;
    Ok(Json(MessageResponse::new("ok")))
}

async fn metrics_endpoint() -> String {
    services::metrics::get_metrics()
}
