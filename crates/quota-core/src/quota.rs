//! Quota policy and storage plan constants.

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Bytes in one GiB.
pub const GIB: u64 = 1024 * 1024 * 1024;

/// Baseline storage every user receives at no cost (1 GiB).
pub const DEFAULT_FREE_STORAGE_LIMIT: u64 = GIB;

/// Storage added by one purchased plan (10 GiB).
pub const DEFAULT_STORAGE_PLAN_SIZE: u64 = 10 * GIB;

/// Price of one storage plan, in whole stablecoin units.
pub const DEFAULT_STORAGE_PLAN_PRICE: f64 = 20.0;

/// Payment method label recorded when none is supplied.
pub const DEFAULT_PAYMENT_METHOD: &str = "USDT";

/// Network label recorded when none is supplied.
pub const DEFAULT_PAYMENT_NETWORK: &str = "Base";

/// Quota settings shared by the service and the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaPolicy {
    /// Free-tier limit in bytes.
    pub free_storage_limit: u64,

    /// Bytes credited per purchased plan.
    pub storage_plan_size: u64,

    /// Price per plan, recorded as the payment amount.
    pub storage_plan_price: f64,
}

impl QuotaPolicy {
    /// Total storage a user is entitled to: free tier plus purchases.
    #[must_use]
    pub const fn available_for(&self, purchased: u64) -> u64 {
        self.free_storage_limit.saturating_add(purchased)
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            free_storage_limit: DEFAULT_FREE_STORAGE_LIMIT,
            storage_plan_size: DEFAULT_STORAGE_PLAN_SIZE,
            storage_plan_price: DEFAULT_STORAGE_PLAN_PRICE,
        }
    }
}

/// Render a byte count as whole GiB, e.g. `10GB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_storage(bytes: u64) -> String {
    format!("{:.0}GB", bytes as f64 / GIB as f64)
}
