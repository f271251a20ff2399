//! In-memory storage implementation.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use quota_core::{PaymentRecord, User, WalletAddress};

use crate::error::{Result, StoreError};
use crate::Store;

/// Map-backed storage. Contents are lost when the process exits.
#[derive(Debug)]
pub struct MemoryStore {
    users: RwLock<HashMap<WalletAddress, User>>,
    free_storage_limit: u64,
}

impl MemoryStore {
    /// Create an empty store that floors entitlements at `free_storage_limit`.
    #[must_use]
    pub fn new(free_storage_limit: u64) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            free_storage_limit,
        }
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Whether the store holds no users.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    fn not_found(wallet: &WalletAddress) -> StoreError {
        StoreError::NotFound {
            wallet: wallet.to_string(),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, wallet: &WalletAddress) -> Result<Option<User>> {
        Ok(self.users.read().await.get(wallet).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        match users.entry(user.wallet_address.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate {
                wallet: user.wallet_address.to_string(),
            }),
            Entry::Vacant(slot) => {
                let mut user = user.clone();
                user.floor_available(self.free_storage_limit);
                slot.insert(user);
                Ok(())
            }
        }
    }

    async fn apply_usage(&self, wallet: &WalletAddress, delta_bytes: i64) -> Result<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(wallet).ok_or_else(|| Self::not_found(wallet))?;

        user.apply_usage(delta_bytes);
        user.floor_available(self.free_storage_limit);

        Ok(user.clone())
    }

    async fn credit_purchase(
        &self,
        wallet: &WalletAddress,
        bytes: u64,
        payment: &PaymentRecord,
    ) -> Result<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(wallet).ok_or_else(|| Self::not_found(wallet))?;

        user.credit_purchase(bytes, payment.clone());
        user.floor_available(self.free_storage_limit);

        Ok(user.clone())
    }
}
