//! Common test utilities for quota service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;

use quota_core::{PaymentRecord, User, WalletAddress, GIB};
use quota_service::{create_router, AppState, ServiceConfig};
use quota_store::{LazyStore, MemoryStore, Store, StoreError};

/// Wallet used for authenticated requests.
pub const TEST_WALLET: &str = "0x52908400098527886e0f7030069857d2e4169ee7";

/// Service API key accepted by the harness.
pub const SERVICE_API_KEY: &str = "test-service-key";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct handle on the backing store for seeding and inspection.
    pub store: Arc<MemoryStore>,
    /// The service API key for service-to-service requests.
    pub service_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with an empty in-memory store.
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new(GIB));
        let lazy = LazyStore::ready(Arc::clone(&store) as Arc<dyn Store>);
        let server = server_for(lazy);

        Self {
            server,
            store,
            service_api_key: SERVICE_API_KEY.to_string(),
        }
    }

    /// Get the authorization header for the test wallet.
    pub fn wallet_auth_header() -> String {
        format!("Bearer {TEST_WALLET}")
    }

    /// The test wallet as a parsed address.
    pub fn wallet() -> WalletAddress {
        TEST_WALLET.parse().expect("valid wallet")
    }

    /// Seed a user record with the given totals.
    pub async fn seed_user(&self, used: u64, purchased: u64) -> User {
        let mut user = User::new(Self::wallet(), GIB);
        user.total_storage_used = used;
        user.total_storage_purchased = purchased;
        user.total_available_storage = GIB + purchased;
        self.store.insert_user(&user).await.expect("seed user");
        user
    }

    /// Read the test wallet's record straight from the store.
    pub async fn stored_user(&self) -> Option<User> {
        self.store
            .find_user(&Self::wallet())
            .await
            .expect("store read")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Test configuration with the service key set.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        service_api_key: Some(SERVICE_API_KEY.into()),
        ..ServiceConfig::default()
    }
}

/// Build a test server around a store handle.
pub fn server_for(store: LazyStore) -> TestServer {
    let state = AppState::with_store(Arc::new(store), test_config());
    let router: Router = create_router(state);
    TestServer::new(router).expect("Failed to create test server")
}

/// A server whose store can never be reached.
pub fn unreachable_server() -> TestServer {
    server_for(LazyStore::new(|| {
        Box::pin(async { Err(StoreError::Unavailable("connection refused".into())) })
    }))
}

/// Which store call should misbehave.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// `find_user` returns a database error.
    Lookup,
    /// `insert_user` returns a database error.
    Insert,
    /// `find_user` panics.
    Panic,
    /// `insert_user` loses a creation race: a concurrent request has
    /// already stored `raced_user` for the wallet.
    DuplicateOnInsert,
}

/// Bytes used by the record a concurrent request created first.
pub const RACED_USED: u64 = 300_000_000;

/// Bytes purchased by the record a concurrent request created first.
pub const RACED_PURCHASED: u64 = 10 * GIB;

/// The record stored by the request that won a creation race.
pub fn raced_user(wallet: WalletAddress) -> User {
    let mut user = User::new(wallet, GIB);
    user.total_storage_used = RACED_USED;
    user.total_storage_purchased = RACED_PURCHASED;
    user.total_available_storage = GIB + RACED_PURCHASED;
    user
}

/// A store that fails in a chosen way.
pub struct FaultyStore {
    fault: Fault,
    inner: MemoryStore,
}

impl FaultyStore {
    pub fn new(fault: Fault) -> Self {
        Self {
            fault,
            inner: MemoryStore::new(GIB),
        }
    }
}

#[async_trait]
impl Store for FaultyStore {
    async fn find_user(&self, wallet: &WalletAddress) -> quota_store::Result<Option<User>> {
        match self.fault {
            Fault::Lookup => Err(StoreError::Database("query failed".into())),
            Fault::Panic => panic!("store exploded"),
            Fault::Insert | Fault::DuplicateOnInsert => self.inner.find_user(wallet).await,
        }
    }

    async fn insert_user(&self, user: &User) -> quota_store::Result<()> {
        match self.fault {
            Fault::Insert => Err(StoreError::Database("insert failed".into())),
            Fault::DuplicateOnInsert => {
                self.inner
                    .insert_user(&raced_user(user.wallet_address.clone()))
                    .await?;
                Err(StoreError::Duplicate {
                    wallet: user.wallet_address.to_string(),
                })
            }
            _ => self.inner.insert_user(user).await,
        }
    }

    async fn apply_usage(
        &self,
        wallet: &WalletAddress,
        delta_bytes: i64,
    ) -> quota_store::Result<User> {
        self.inner.apply_usage(wallet, delta_bytes).await
    }

    async fn credit_purchase(
        &self,
        wallet: &WalletAddress,
        bytes: u64,
        payment: &PaymentRecord,
    ) -> quota_store::Result<User> {
        self.inner.credit_purchase(wallet, bytes, payment).await
    }
}

/// A server backed by a store with the given fault.
pub fn faulty_server(fault: Fault) -> TestServer {
    server_for(LazyStore::ready(Arc::new(FaultyStore::new(fault))))
}
