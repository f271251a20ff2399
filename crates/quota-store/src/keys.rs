//! Key encoding utilities for `RocksDB`.

use quota_core::WalletAddress;

/// Create a user key from a wallet address.
///
/// The address is already lowercase, so equal addresses map to equal keys.
#[must_use]
pub fn user_key(wallet: &WalletAddress) -> Vec<u8> {
    wallet.as_bytes().to_vec()
}
