//! Error types for quota bookkeeping.

use crate::wallet::WalletError;

/// Result type for quota operations.
pub type Result<T> = std::result::Result<T, QuotaError>;

/// Errors that can occur in quota operations.
#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    /// Invalid wallet address.
    #[error("invalid wallet address: {0}")]
    InvalidWallet(#[from] WalletError),

    /// Invalid transaction hash.
    #[error("invalid transaction hash: {0}")]
    InvalidTransactionHash(String),
}

/// Check that a transaction hash is `0x` followed by 64 hex digits.
///
/// # Errors
///
/// Returns `QuotaError::InvalidTransactionHash` otherwise.
pub fn validate_transaction_hash(hash: &str) -> Result<()> {
    let valid = hash
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 64 && hex.bytes().all(|b| b.is_ascii_hexdigit()));

    if valid {
        Ok(())
    } else {
        Err(QuotaError::InvalidTransactionHash(hash.to_string()))
    }
}
