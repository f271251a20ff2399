//! Core types for the storage quota service.
//!
//! This crate provides the foundational types shared by the store, the HTTP
//! service and the client:
//!
//! - **Identifiers**: `WalletAddress`
//! - **Users**: `User`, `PaymentRecord`
//! - **Quota**: `QuotaPolicy`, `StorageInfo`
//!
//! # Quota Arithmetic
//!
//! All sizes are bytes stored as `u64`. A user's entitlement is the free-tier
//! limit plus purchased bytes; remaining storage saturates at zero.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod quota;
pub mod storage;
pub mod user;
pub mod wallet;

pub use error::{validate_transaction_hash, QuotaError, Result};
pub use quota::{
    format_storage, QuotaPolicy, DEFAULT_FREE_STORAGE_LIMIT, DEFAULT_PAYMENT_METHOD,
    DEFAULT_PAYMENT_NETWORK, DEFAULT_STORAGE_PLAN_PRICE, DEFAULT_STORAGE_PLAN_SIZE, GIB,
};
pub use storage::StorageInfo;
pub use user::{PaymentRecord, User};
pub use wallet::{WalletAddress, WalletError, BEARER_PREFIX};
