use erp_core::config::ErpConfig;
use erp_core::observability::logging::init_tracing;
use erp_service::services::Database;
use erp_service::{build_router, AppState};
use std::net::SocketAddr;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), erp_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = ErpConfig::load()?;

    init_tracing(&config.service_name, &config.log_level);
    erp_service::services::metrics::init_metrics();

    tracing::info!(service = %config.service_name, "Starting ERP service");

    let db = Database::new(&config.database).await?;
    db.run_migrations().await?;
    tracing::info!("Database initialized");

    let port = config.port;
    let state = AppState::new(config, db);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| erp_core::error::AppError::InternalError(anyhow::anyhow!(e)))?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
