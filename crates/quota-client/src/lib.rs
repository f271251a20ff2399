//! Storage quota client SDK.
//!
//! This crate provides the client side of the storage quota service:
//!
//! - `QuotaClient` for the quota HTTP API
//! - `PurchaseFlow`, which pays for a storage plan with a stablecoin
//!   transfer and reports the payment
//! - `StorageEvents` and `StorageUsageMonitor`, which keep usage displays
//!   fresh after a purchase
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use quota_client::{PurchaseConfig, PurchaseFlow, QuotaClient, RpcWallet, StorageEvents};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = QuotaClient::new("http://quota.storage.svc:8080")?;
//! let wallet = Arc::new(RpcWallet::new("http://localhost:8545")?);
//! let config = PurchaseConfig::from_env().ok_or("PAYMENT_ADDRESS not set")?;
//!
//! let events = StorageEvents::new();
//! let flow = PurchaseFlow::new(config, client, wallet.clone(), events.clone())
//!     .with_wallet(wallet);
//!
//! let info = flow.purchase().await?;
//! println!("Remaining storage: {} bytes", info.remaining_storage);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod chain;
mod client;
mod error;
mod events;
mod monitor;
mod purchase;
mod types;

pub use chain::{ChainReader, Erc20, RpcWallet, TransactionRequest, Wallet};
pub use client::{ClientOptions, QuotaClient};
pub use error::{ChainError, ClientError, PurchaseError};
pub use events::{StorageEvents, StorageSubscription};
pub use monitor::{usage_percent, usage_summary, StorageUsageMonitor};
pub use purchase::{
    NoticeLevel, Notifier, PlanOffer, PurchaseConfig, PurchaseFlow, PurchaseState,
    TracingNotifier, BASE_CHAIN_ID, DEFAULT_PAYMENT_AMOUNT, DEFAULT_TOKEN_CONTRACT,
    DEFAULT_TOKEN_DECIMALS,
};
pub use types::*;
