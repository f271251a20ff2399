//! Storage quota service - HTTP API for wallet storage quotas.
//!
//! This is the main entry point for the quota service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quota_service::{create_router, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,quota=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting storage quota service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        store_backend = %config.store_backend,
        free_storage_limit = config.policy.free_storage_limit,
        storage_plan_size = config.policy.storage_plan_size,
        service_key_configured = %config.service_api_key.is_some(),
        "Service configuration loaded"
    );

    // The store connects on the first request that needs it.
    let state = AppState::new(config.clone()).map_err(|e| {
        tracing::error!(error = %e, "Invalid store configuration");
        e
    })?;

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
