//! Health check handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Whether the store connection has been established yet.
    ///
    /// The store connects on first use, so `false` right after startup is
    /// normal and does not make the service unhealthy.
    pub store_connected: bool,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "storage-quota",
        version: env!("CARGO_PKG_VERSION"),
        store_connected: state.store.is_connected(),
    })
}
