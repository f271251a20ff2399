//! User record and payment history.
//!
//! A `User` is keyed by wallet address and tracks storage counters plus the
//! list of payments made for extra storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quota::{DEFAULT_PAYMENT_METHOD, DEFAULT_PAYMENT_NETWORK};
use crate::WalletAddress;

/// A persisted storage-quota user.
///
/// `total_available_storage` is kept alongside `total_storage_purchased` but
/// is not read by the quota query path, which derives availability from the
/// free tier plus purchases instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Lowercase wallet address; immutable after creation.
    pub wallet_address: WalletAddress,

    /// Bytes consumed.
    pub total_storage_used: u64,

    /// Bytes bought via payment.
    pub total_storage_purchased: u64,

    /// Stored entitlement, never below the free-tier limit once saved.
    pub total_available_storage: u64,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Email address; unique across users when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Payments made for extra storage, oldest first.
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,

    /// When storage was last checked.
    pub last_storage_check: DateTime<Utc>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a user with default counters and the free-tier entitlement.
    #[must_use]
    pub fn new(wallet_address: WalletAddress, free_storage_limit: u64) -> Self {
        let now = Utc::now();
        Self {
            wallet_address,
            total_storage_used: 0,
            total_storage_purchased: 0,
            total_available_storage: free_storage_limit,
            name: None,
            email: None,
            image: None,
            payments: Vec::new(),
            last_storage_check: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Storage left, computed from the stored entitlement. Never negative.
    #[must_use]
    pub const fn remaining_storage(&self) -> u64 {
        self.total_available_storage
            .saturating_sub(self.total_storage_used)
    }

    /// Check whether `required` more bytes fit in the remaining storage.
    #[must_use]
    pub const fn has_enough_storage(&self, required: u64) -> bool {
        self.remaining_storage() >= required
    }

    /// Apply a signed usage delta; the counter never drops below zero.
    pub fn apply_usage(&mut self, delta: i64) {
        self.total_storage_used = if delta.is_negative() {
            self.total_storage_used
                .saturating_sub(delta.unsigned_abs())
        } else {
            self.total_storage_used.saturating_add(delta.unsigned_abs())
        };
        let now = Utc::now();
        self.last_storage_check = now;
        self.updated_at = now;
    }

    /// Credit purchased bytes and append the payment that paid for them.
    pub fn credit_purchase(&mut self, bytes: u64, payment: PaymentRecord) {
        self.total_storage_purchased = self.total_storage_purchased.saturating_add(bytes);
        self.total_available_storage = self.total_available_storage.saturating_add(bytes);
        self.payments.push(payment);
        self.updated_at = Utc::now();
    }

    /// Clamp the stored entitlement up to the free-tier limit.
    ///
    /// Stores call this before every write. Empty emails are dropped so the
    /// uniqueness constraint only applies to real addresses.
    pub fn floor_available(&mut self, free_storage_limit: u64) {
        if self.total_available_storage < free_storage_limit {
            self.total_available_storage = free_storage_limit;
        }
        if self.email.as_deref().is_some_and(|e| e.trim().is_empty()) {
            self.email = None;
        }
    }
}

/// A single payment for extra storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    /// On-chain transaction hash.
    pub transaction_hash: String,

    /// Payment method label (token symbol).
    #[serde(default = "default_payment_method")]
    pub payment_method: String,

    /// Network label.
    #[serde(default = "default_payment_network")]
    pub network: String,

    /// Amount paid, in whole token units.
    pub amount: f64,

    /// When the payment was recorded.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl PaymentRecord {
    /// Create a payment record stamped with the current time.
    ///
    /// Empty labels fall back to the defaults.
    #[must_use]
    pub fn new(
        transaction_hash: impl Into<String>,
        payment_method: Option<String>,
        network: Option<String>,
        amount: f64,
    ) -> Self {
        Self {
            transaction_hash: transaction_hash.into(),
            payment_method: payment_method
                .filter(|m| !m.is_empty())
                .unwrap_or_else(default_payment_method),
            network: network
                .filter(|n| !n.is_empty())
                .unwrap_or_else(default_payment_network),
            amount,
            timestamp: Utc::now(),
        }
    }
}

fn default_payment_method() -> String {
    DEFAULT_PAYMENT_METHOD.to_string()
}

fn default_payment_network() -> String {
    DEFAULT_PAYMENT_NETWORK.to_string()
}
