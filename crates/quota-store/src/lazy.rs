//! Lazily established, process-wide store handle.
//!
//! The first caller of `LazyStore::get` connects to the configured backend;
//! every later caller receives the same connection. A failed connection is
//! not cached, so the next request tries again.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::OnceCell;

use crate::error::Result;
use crate::memory::MemoryStore;
use crate::postgres::PgStore;
use crate::Store;

/// Future returned by a connect function.
pub type ConnectFuture = BoxFuture<'static, Result<Arc<dyn Store>>>;

type ConnectFn = Box<dyn Fn() -> ConnectFuture + Send + Sync>;

/// Which backend to connect to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// In-process map; nothing is persisted.
    Memory,

    /// PostgreSQL.
    Postgres {
        /// Connection URL.
        url: String,
        /// Pool size.
        max_connections: u32,
        /// How long to wait for a connection before giving up.
        connect_timeout: Duration,
    },

    /// Embedded `RocksDB` at `path`.
    #[cfg(feature = "rocksdb-backend")]
    Rocks {
        /// Database directory.
        path: String,
    },
}

impl Backend {
    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres { .. } => "postgres",
            #[cfg(feature = "rocksdb-backend")]
            Self::Rocks { .. } => "rocksdb",
        }
    }
}

/// Store connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Backend to connect to.
    pub backend: Backend,

    /// Free-tier floor applied to `total_available_storage` on every write.
    pub free_storage_limit: u64,
}

impl StoreConfig {
    /// In-memory store configuration.
    #[must_use]
    pub const fn memory(free_storage_limit: u64) -> Self {
        Self {
            backend: Backend::Memory,
            free_storage_limit,
        }
    }

    /// Connect to the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the backend cannot be reached.
    pub async fn connect(&self) -> Result<Arc<dyn Store>> {
        let store: Arc<dyn Store> = match &self.backend {
            Backend::Memory => Arc::new(MemoryStore::new(self.free_storage_limit)),
            Backend::Postgres {
                url,
                max_connections,
                connect_timeout,
            } => Arc::new(
                PgStore::connect(
                    url,
                    *max_connections,
                    *connect_timeout,
                    self.free_storage_limit,
                )
                .await?,
            ),
            #[cfg(feature = "rocksdb-backend")]
            Backend::Rocks { path } => Arc::new(crate::rocks::RocksStore::open(
                path,
                self.free_storage_limit,
            )?),
        };

        Ok(store)
    }
}

/// A store handle that connects on first use.
pub struct LazyStore {
    connect: ConnectFn,
    cell: OnceCell<Arc<dyn Store>>,
}

impl LazyStore {
    /// Create a handle around a custom connect function.
    pub fn new<F>(connect: F) -> Self
    where
        F: Fn() -> ConnectFuture + Send + Sync + 'static,
    {
        Self {
            connect: Box::new(connect),
            cell: OnceCell::new(),
        }
    }

    /// Create a handle that connects using `config`.
    #[must_use]
    pub fn from_config(config: StoreConfig) -> Self {
        Self::new(move || {
            let config = config.clone();
            Box::pin(async move {
                let backend = config.backend.name();
                match config.connect().await {
                    Ok(store) => {
                        tracing::info!(backend, "Store connected");
                        Ok(store)
                    }
                    Err(e) => {
                        tracing::error!(backend, error = %e, "Store connection failed");
                        Err(e)
                    }
                }
            })
        })
    }

    /// Create a handle that is already connected to `store`.
    #[must_use]
    pub fn ready(store: Arc<dyn Store>) -> Self {
        let mut handle = Self::new(|| {
            Box::pin(async {
                Err(crate::StoreError::Unavailable(
                    "connect called on a ready store".into(),
                ))
            })
        });
        handle.cell = OnceCell::new_with(Some(store));
        handle
    }

    /// Return the shared store, connecting first if needed.
    ///
    /// # Errors
    ///
    /// Returns the connect error; the next call retries.
    pub async fn get(&self) -> Result<Arc<dyn Store>> {
        self.cell
            .get_or_try_init(|| (self.connect)())
            .await
            .map(Arc::clone)
    }

    /// Whether a connection has been established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.cell.initialized()
    }
}

impl fmt::Debug for LazyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyStore")
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
