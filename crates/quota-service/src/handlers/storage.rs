//! Wallet-facing storage handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use quota_core::{validate_transaction_hash, PaymentRecord, StorageInfo, User, WalletAddress};
use quota_store::{Store, StoreError};

use crate::auth::WalletAuth;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

// ============================================================================
// Error Messages
// ============================================================================

/// The store could not be reached.
pub const DATABASE_UNAVAILABLE_MESSAGE: &str = "Database connection failed";

/// Reading the user record failed.
pub const LOOKUP_FAILED_MESSAGE: &str = "Failed to lookup user";

/// Writing a new user record failed.
pub const CREATE_FAILED_MESSAGE: &str = "Failed to create new user";

/// Crediting a purchase failed.
pub const PURCHASE_FAILED_MESSAGE: &str = "Failed to record purchase";

/// Credit report sent after a confirmed storage payment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    /// On-chain transaction hash.
    pub transaction_hash: String,
    /// Token symbol used for payment.
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Network the payment was made on.
    #[serde(default)]
    pub network: Option<String>,
}

/// Get storage totals for the calling wallet.
///
/// GET /api/storage/info
///
/// Unknown wallets get a default record created on the spot.
pub async fn get_storage_info(
    State(state): State<Arc<AppState>>,
    auth: WalletAuth,
) -> Result<Json<StorageInfo>, ApiError> {
    let store = connect(&state).await?;
    let policy = state.policy();

    let info = match lookup_user(store.as_ref(), &auth.wallet).await? {
        Some(user) => StorageInfo::for_user(&user, policy),
        None => {
            let created =
                create_user(store.as_ref(), &auth.wallet, policy.free_storage_limit).await?;
            StorageInfo::for_user(&created, policy)
        }
    };

    tracing::debug!(
        wallet = %auth.wallet,
        used = info.total_storage_used,
        available = info.total_available_storage,
        "Storage info served"
    );

    Ok(Json(info))
}

/// Record a confirmed storage plan payment.
///
/// POST /api/storage/purchase
///
/// Credits one plan's worth of storage and returns the updated totals.
pub async fn purchase_storage(
    State(state): State<Arc<AppState>>,
    auth: WalletAuth,
    ApiJson(request): ApiJson<PurchaseRequest>,
) -> Result<Json<StorageInfo>, ApiError> {
    validate_transaction_hash(&request.transaction_hash)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let store = connect(&state).await?;
    let policy = state.policy();

    if lookup_user(store.as_ref(), &auth.wallet).await?.is_none() {
        create_user(store.as_ref(), &auth.wallet, policy.free_storage_limit).await?;
    }

    let payment = PaymentRecord::new(
        request.transaction_hash,
        Some(
            request
                .payment_method
                .unwrap_or_else(|| state.config.default_payment_method.clone()),
        ),
        Some(
            request
                .network
                .unwrap_or_else(|| state.config.default_payment_network.clone()),
        ),
        policy.storage_plan_price,
    );

    let user = store
        .credit_purchase(&auth.wallet, policy.storage_plan_size, &payment)
        .await
        .map_err(|e| {
            tracing::error!(wallet = %auth.wallet, error = %e, "Failed to credit purchase");
            ApiError::Internal(PURCHASE_FAILED_MESSAGE)
        })?;

    tracing::info!(
        wallet = %auth.wallet,
        tx_hash = %payment.transaction_hash,
        method = %payment.payment_method,
        network = %payment.network,
        bytes = policy.storage_plan_size,
        "Storage purchase credited"
    );

    Ok(Json(StorageInfo::for_user(&user, policy)))
}

// ============================================================================
// Shared steps
// ============================================================================

/// Get the shared store, mapping connect failures to 503.
pub(crate) async fn connect(state: &AppState) -> Result<Arc<dyn Store>, ApiError> {
    state.store.get().await.map_err(|e| {
        tracing::error!(error = %e, "Database connection failed");
        ApiError::ServiceUnavailable(DATABASE_UNAVAILABLE_MESSAGE)
    })
}

/// Look up a user, mapping store failures to 500.
pub(crate) async fn lookup_user(
    store: &dyn Store,
    wallet: &WalletAddress,
) -> Result<Option<User>, ApiError> {
    store.find_user(wallet).await.map_err(|e| {
        tracing::error!(wallet = %wallet, error = %e, "Error finding user");
        ApiError::Internal(LOOKUP_FAILED_MESSAGE)
    })
}

/// Insert a default record for `wallet`.
///
/// Losing a creation race to a concurrent request is not an error; the
/// winner's record is read back instead.
async fn create_user(
    store: &dyn Store,
    wallet: &WalletAddress,
    free_storage_limit: u64,
) -> Result<User, ApiError> {
    let user = User::new(wallet.clone(), free_storage_limit);

    match store.insert_user(&user).await {
        Ok(()) => {
            tracing::info!(wallet = %wallet, "Created storage record");
            Ok(user)
        }
        Err(StoreError::Duplicate { .. }) => {
            tracing::debug!(wallet = %wallet, "Record created concurrently, re-reading");
            lookup_user(store, wallet)
                .await?
                .ok_or(ApiError::Internal(CREATE_FAILED_MESSAGE))
        }
        Err(e) => {
            tracing::error!(wallet = %wallet, error = %e, "Error creating user");
            Err(ApiError::Internal(CREATE_FAILED_MESSAGE))
        }
    }
}
