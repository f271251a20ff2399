//! Storage layer for the storage quota service.
//!
//! This crate persists `User` records keyed by wallet address, together with
//! their payment history.
//!
//! # Backends
//!
//! - `PgStore`: PostgreSQL via `sqlx`, schema applied once per process
//! - `MemoryStore`: in-process map, for tests and local development
//! - `RocksStore`: embedded `RocksDB` (feature `rocksdb-backend`)
//!
//! Handlers reach a backend through `LazyStore`, which connects on first use
//! and reuses the connection for the life of the process.
//!
//! # Example
//!
//! ```no_run
//! use quota_core::{User, WalletAddress};
//! use quota_store::{LazyStore, StoreConfig};
//!
//! # async fn example() -> quota_store::Result<()> {
//! let store = LazyStore::from_config(StoreConfig::memory(1 << 30));
//! let wallet: WalletAddress = "0xabc".parse().unwrap();
//!
//! let backend = store.get().await?;
//! backend.insert_user(&User::new(wallet.clone(), 1 << 30)).await?;
//! assert!(backend.find_user(&wallet).await?.is_some());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
#[cfg(feature = "rocksdb-backend")]
pub mod keys;
pub mod lazy;
pub mod memory;
pub mod postgres;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use lazy::{Backend, LazyStore, StoreConfig};
pub use memory::MemoryStore;
pub use postgres::PgStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use async_trait::async_trait;
use quota_core::{PaymentRecord, User, WalletAddress};

/// The storage trait defining all user record operations.
///
/// Every write floors `total_available_storage` at the backend's free-tier
/// limit before persisting.
#[async_trait]
pub trait Store: Send + Sync {
    /// Get a user by wallet address.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn find_user(&self, wallet: &WalletAddress) -> Result<Option<User>>;

    /// Insert a new user record.
    ///
    /// # Errors
    ///
    /// - `StoreError::Duplicate` if a user with the same wallet exists.
    /// - Any other error if the database operation fails.
    async fn insert_user(&self, user: &User) -> Result<()>;

    /// Apply a signed usage delta to a user's consumed storage.
    ///
    /// Returns the updated user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user doesn't exist.
    async fn apply_usage(&self, wallet: &WalletAddress, delta_bytes: i64) -> Result<User>;

    /// Credit purchased storage and append the payment record.
    ///
    /// Returns the updated user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user doesn't exist.
    async fn credit_purchase(
        &self,
        wallet: &WalletAddress,
        bytes: u64,
        payment: &PaymentRecord,
    ) -> Result<User>;
}
