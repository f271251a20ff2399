//! Service configuration.

use std::time::Duration;

use quota_core::{
    QuotaPolicy, DEFAULT_FREE_STORAGE_LIMIT, DEFAULT_PAYMENT_METHOD, DEFAULT_PAYMENT_NETWORK,
    DEFAULT_STORAGE_PLAN_PRICE, DEFAULT_STORAGE_PLAN_SIZE,
};
use quota_store::{Backend, StoreConfig};

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Storage backend: "postgres", "memory" or "rocksdb" (default: "postgres").
    ///
    /// "memory" keeps nothing across restarts and must be asked for explicitly.
    pub store_backend: String,

    /// PostgreSQL connection URL (optional).
    pub database_url: Option<String>,

    /// PostgreSQL pool size (default: 10).
    pub database_max_connections: u32,

    /// Seconds to wait for a database connection (default: 5).
    pub database_connect_timeout_seconds: u64,

    /// Path to the `RocksDB` data directory (default: "/data/storage-quota").
    pub data_dir: String,

    /// Quota policy (free tier, plan size and price).
    pub policy: QuotaPolicy,

    /// Payment method recorded when a purchase report omits it.
    pub default_payment_method: String,

    /// Network recorded when a purchase report omits it.
    pub default_payment_network: String,

    /// Service API key for service-to-service auth.
    pub service_api_key: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            store_backend: std::env::var("STORE_BACKEND").unwrap_or(defaults.store_backend),
            database_url: std::env::var("DATABASE_URL").ok(),
            database_max_connections: env_parse("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            database_connect_timeout_seconds: env_parse("DATABASE_CONNECT_TIMEOUT_SECONDS")
                .unwrap_or(defaults.database_connect_timeout_seconds),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            policy: QuotaPolicy {
                free_storage_limit: env_parse("FREE_STORAGE_LIMIT")
                    .unwrap_or(DEFAULT_FREE_STORAGE_LIMIT),
                storage_plan_size: env_parse("STORAGE_PLAN_SIZE")
                    .unwrap_or(DEFAULT_STORAGE_PLAN_SIZE),
                storage_plan_price: env_parse("STORAGE_PLAN_PRICE")
                    .unwrap_or(DEFAULT_STORAGE_PLAN_PRICE),
            },
            default_payment_method: std::env::var("DEFAULT_PAYMENT_METHOD")
                .unwrap_or(defaults.default_payment_method),
            default_payment_network: std::env::var("DEFAULT_PAYMENT_NETWORK")
                .unwrap_or(defaults.default_payment_network),
            service_api_key: std::env::var("SERVICE_API_KEY").ok(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }

    /// Build the store connection settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an unknown backend, for "postgres" without
    /// `DATABASE_URL`, and for "rocksdb" in a build without `RocksDB` support.
    pub fn store_config(&self) -> Result<StoreConfig, ConfigError> {
        let backend = match self.store_backend.as_str() {
            "postgres" => {
                let url = self
                    .database_url
                    .clone()
                    .ok_or(ConfigError::MissingDatabaseUrl)?;
                Backend::Postgres {
                    url,
                    max_connections: self.database_max_connections,
                    connect_timeout: Duration::from_secs(self.database_connect_timeout_seconds),
                }
            }
            #[cfg(feature = "rocksdb-backend")]
            "rocksdb" => Backend::Rocks {
                path: self.data_dir.clone(),
            },
            #[cfg(not(feature = "rocksdb-backend"))]
            "rocksdb" => return Err(ConfigError::RocksDbDisabled),
            "memory" => {
                tracing::warn!("Using in-memory store - storage records are lost on restart");
                Backend::Memory
            }
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        Ok(StoreConfig {
            backend,
            free_storage_limit: self.policy.free_storage_limit,
        })
    }
}

/// Configuration that cannot be used to start the service.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `STORE_BACKEND` names no known backend.
    #[error("unknown STORE_BACKEND {0:?} (expected postgres, memory or rocksdb)")]
    UnknownBackend(String),

    /// The postgres backend was selected without a connection URL.
    #[error("STORE_BACKEND=postgres requires DATABASE_URL")]
    MissingDatabaseUrl,

    /// The rocksdb backend was selected but is not compiled in.
    #[error("STORE_BACKEND=rocksdb requires the rocksdb-backend feature")]
    RocksDbDisabled,
}

/// Parse an environment variable, ignoring it when absent or malformed.
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            store_backend: "postgres".into(),
            database_url: None,
            database_max_connections: 10,
            database_connect_timeout_seconds: 5,
            data_dir: "/data/storage-quota".into(),
            policy: QuotaPolicy::default(),
            default_payment_method: DEFAULT_PAYMENT_METHOD.into(),
            default_payment_network: DEFAULT_PAYMENT_NETWORK.into(),
            service_api_key: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024, // 1MB
            request_timeout_seconds: 10,
        }
    }
}
