//! Application state.

use std::sync::Arc;

use quota_core::QuotaPolicy;
use quota_store::LazyStore;

use crate::config::{ConfigError, ServiceConfig};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The process-wide store handle, connected on first use.
    pub store: Arc<LazyStore>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create state that connects to the configured backend on first use.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the configuration names no usable backend.
    pub fn new(config: ServiceConfig) -> Result<Self, ConfigError> {
        let store = LazyStore::from_config(config.store_config()?);
        Ok(Self::with_store(Arc::new(store), config))
    }

    /// Create state around an existing store handle.
    #[must_use]
    pub fn with_store(store: Arc<LazyStore>, config: ServiceConfig) -> Self {
        if config.service_api_key.is_none() {
            tracing::warn!("SERVICE_API_KEY not set - usage reporting endpoints will reject requests");
        }

        Self { store, config }
    }

    /// The quota policy in effect.
    #[must_use]
    pub fn policy(&self) -> &QuotaPolicy {
        &self.config.policy
    }
}
