//! Storage info reported to clients.

use serde::{Deserialize, Serialize};

use crate::quota::QuotaPolicy;
use crate::User;

/// The quota snapshot returned by the storage info endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    /// Bytes consumed.
    pub total_storage_used: u64,
    /// Bytes bought via payment.
    pub total_storage_purchased: u64,
    /// Free tier plus purchases.
    pub total_available_storage: u64,
    /// `max(0, available - used)`.
    pub remaining_storage: u64,
}

impl StorageInfo {
    /// Snapshot for a user that was just created with default values.
    #[must_use]
    pub const fn fresh(policy: &QuotaPolicy) -> Self {
        Self {
            total_storage_used: 0,
            total_storage_purchased: 0,
            total_available_storage: policy.free_storage_limit,
            remaining_storage: policy.free_storage_limit,
        }
    }

    /// Snapshot for an existing user.
    ///
    /// Availability is recomputed from the policy's free tier and the
    /// purchased bytes; the user's stored `total_available_storage` is not
    /// consulted.
    #[must_use]
    pub const fn for_user(user: &User, policy: &QuotaPolicy) -> Self {
        let available = policy.available_for(user.total_storage_purchased);
        Self {
            total_storage_used: user.total_storage_used,
            total_storage_purchased: user.total_storage_purchased,
            total_available_storage: available,
            remaining_storage: available.saturating_sub(user.total_storage_used),
        }
    }
}
