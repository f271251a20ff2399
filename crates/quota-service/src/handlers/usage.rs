//! Storage consumption handlers for services.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use quota_core::{StorageInfo, User, WalletAddress};
use quota_store::StoreError;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::handlers::storage::{connect, lookup_user};
use crate::state::AppState;

/// Usage report from a service.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRequest {
    /// Wallet whose storage changed.
    pub wallet_address: String,
    /// Signed change in bytes; negative when files were removed.
    pub bytes: i64,
}

/// Pre-flight storage check request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckStorageRequest {
    /// Wallet to check.
    pub wallet_address: String,
    /// Bytes the caller is about to store.
    pub required_bytes: u64,
}

/// Pre-flight storage check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckStorageResponse {
    /// Whether the wallet has room for `required_bytes`.
    pub sufficient: bool,
    /// Bytes left before the request.
    pub remaining_storage: u64,
    /// Echo of the requested amount.
    pub required_bytes: u64,
}

fn parse_wallet(raw: &str) -> Result<WalletAddress, ApiError> {
    raw.parse()
        .map_err(|e: quota_core::WalletError| ApiError::BadRequest(e.to_string()))
}

/// Apply a storage usage delta.
///
/// POST /api/storage/usage
///
/// Requires service API key authentication.
pub async fn report_usage(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    ApiJson(request): ApiJson<UsageRequest>,
) -> Result<Json<StorageInfo>, ApiError> {
    let wallet = parse_wallet(&request.wallet_address)?;
    let store = connect(&state).await?;

    let user = store
        .apply_usage(&wallet, request.bytes)
        .await
        .map_err(|e| match e {
            StoreError::NotFound { .. } => {
                ApiError::NotFound(format!("No storage record for {wallet}"))
            }
            other => {
                tracing::error!(wallet = %wallet, error = %other, "Failed to apply usage");
                ApiError::Internal("Failed to update storage usage")
            }
        })?;

    tracing::info!(
        service = %auth.service_name,
        wallet = %wallet,
        delta = request.bytes,
        used = user.total_storage_used,
        "Storage usage recorded"
    );

    Ok(Json(StorageInfo::for_user(&user, state.policy())))
}

/// Check whether a wallet can store `required_bytes` more.
///
/// POST /api/storage/check
///
/// Unknown wallets are judged against a default record, which is not saved.
pub async fn check_storage(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    ApiJson(request): ApiJson<CheckStorageRequest>,
) -> Result<Json<CheckStorageResponse>, ApiError> {
    let wallet = parse_wallet(&request.wallet_address)?;
    let store = connect(&state).await?;
    let policy = state.policy();

    let user = lookup_user(store.as_ref(), &wallet)
        .await?
        .unwrap_or_else(|| User::new(wallet.clone(), policy.free_storage_limit));

    let info = StorageInfo::for_user(&user, policy);

    Ok(Json(CheckStorageResponse {
        sufficient: info.remaining_storage >= request.required_bytes,
        remaining_storage: info.remaining_storage,
        required_bytes: request.required_bytes,
    }))
}
