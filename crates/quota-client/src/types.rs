//! Request and response types for the quota API.

use serde::{Deserialize, Serialize};

pub use quota_core::StorageInfo;

/// Credit report sent after a storage payment is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReport {
    /// On-chain transaction hash.
    pub transaction_hash: String,
    /// Token symbol used for payment.
    pub payment_method: String,
    /// Network label.
    pub network: String,
}

/// Error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error message.
    pub error: String,
}
