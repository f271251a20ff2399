//! Schema definitions and one-time initialization.
//!
//! PostgreSQL tables are created by the embedded migrations; `RocksDB` uses
//! column families. Initialization is idempotent and runs at most once per
//! process.

use sqlx::migrate::Migrator;
use sqlx::PgPool;
use tokio::sync::OnceCell;

use crate::error::{Result, StoreError};

/// PostgreSQL table names.
pub mod table {
    /// User records, keyed by `wallet_address`.
    pub const USERS: &str = "users";

    /// Payment history, keyed by a serial id and indexed by `wallet_address`.
    pub const PAYMENTS: &str = "payments";
}

/// Column family names for the `RocksDB` database.
#[cfg(feature = "rocksdb-backend")]
pub mod cf {
    /// User records (payments embedded), keyed by wallet address.
    pub const USERS: &str = "users";
}

/// Returns all column family names for database initialization.
#[cfg(feature = "rocksdb-backend")]
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::USERS]
}

/// Embedded PostgreSQL migrations.
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Set once the schema has been applied in this process.
static SCHEMA_READY: OnceCell<()> = OnceCell::const_new();

/// Apply the PostgreSQL schema the first time this is called.
///
/// Later calls return immediately. A failed attempt leaves the flag unset so
/// the next connection retries.
///
/// # Errors
///
/// Returns an error if the migrations fail.
pub async fn ensure_postgres_schema(pool: &PgPool) -> Result<()> {
    SCHEMA_READY
        .get_or_try_init(|| async {
            MIGRATOR.run(pool).await?;
            tracing::info!(
                tables = ?[table::USERS, table::PAYMENTS],
                "PostgreSQL schema initialized"
            );
            Ok::<(), StoreError>(())
        })
        .await
        .map(|_| ())
}
