//! `RocksDB` storage implementation.
//!
//! Users are stored as CBOR blobs with their payments embedded. Writes that
//! read first hold a process-local lock so inserts cannot race each other.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rocksdb::{BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options};

use quota_core::{PaymentRecord, User, WalletAddress};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    write_lock: Mutex<()>,
    free_storage_limit: u64,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P, free_storage_limit: u64) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
            free_storage_limit,
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Database("write lock poisoned".into()))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get(&self, wallet: &WalletAddress) -> Result<Option<User>> {
        let cf = self.cf(cf::USERS)?;

        self.db
            .get_cf(&cf, keys::user_key(wallet))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn put(&self, user: &mut User) -> Result<()> {
        user.floor_available(self.free_storage_limit);

        let cf = self.cf(cf::USERS)?;
        let value = Self::serialize(user)?;

        self.db
            .put_cf(&cf, keys::user_key(&user.wallet_address), value)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn update<F>(&self, wallet: &WalletAddress, apply: F) -> Result<User>
    where
        F: FnOnce(&mut User),
    {
        let _guard = self.lock()?;

        let mut user = self.get(wallet)?.ok_or_else(|| StoreError::NotFound {
            wallet: wallet.to_string(),
        })?;
        apply(&mut user);
        self.put(&mut user)?;

        Ok(user)
    }
}

#[async_trait]
impl Store for RocksStore {
    async fn find_user(&self, wallet: &WalletAddress) -> Result<Option<User>> {
        self.get(wallet)
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let _guard = self.lock()?;

        if self.get(&user.wallet_address)?.is_some() {
            return Err(StoreError::Duplicate {
                wallet: user.wallet_address.to_string(),
            });
        }

        self.put(&mut user.clone())
    }

    async fn apply_usage(&self, wallet: &WalletAddress, delta_bytes: i64) -> Result<User> {
        self.update(wallet, |user| user.apply_usage(delta_bytes))
    }

    async fn credit_purchase(
        &self,
        wallet: &WalletAddress,
        bytes: u64,
        payment: &PaymentRecord,
    ) -> Result<User> {
        self.update(wallet, |user| user.credit_purchase(bytes, payment.clone()))
    }
}
