//! Storage usage display.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use quota_core::{format_storage, WalletAddress};

use crate::client::QuotaClient;
use crate::events::StorageEvents;
use crate::types::StorageInfo;

/// Keeps a wallet's storage totals fresh while mounted.
///
/// Fetches once on mount, then again every time the storage-updated
/// signal fires. Dropping the monitor unmounts it and ends its
/// subscription.
#[derive(Debug)]
pub struct StorageUsageMonitor {
    info: watch::Receiver<Option<StorageInfo>>,
    task: JoinHandle<()>,
}

impl StorageUsageMonitor {
    /// Mount a monitor for `wallet`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn mount(client: QuotaClient, wallet: WalletAddress, events: &StorageEvents) -> Self {
        let mut subscription = events.subscribe();
        let (tx, info) = watch::channel(None);

        let task = tokio::spawn(async move {
            loop {
                match client.storage_info(&wallet).await {
                    Ok(latest) => {
                        tx.send_replace(Some(latest));
                    }
                    Err(e) => {
                        tracing::warn!(wallet = %wallet, error = %e, "Failed to fetch storage info");
                    }
                }

                if !subscription.changed().await {
                    break;
                }
            }
        });

        Self { info, task }
    }

    /// The most recently fetched totals, if any fetch has succeeded.
    #[must_use]
    pub fn current(&self) -> Option<StorageInfo> {
        *self.info.borrow()
    }

    /// Wait for the next successful fetch.
    ///
    /// Returns `None` if the monitor's task has stopped.
    pub async fn refreshed(&mut self) -> Option<StorageInfo> {
        self.info.changed().await.ok()?;
        *self.info.borrow_and_update()
    }
}

impl Drop for StorageUsageMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Usage line shown next to the progress bar, e.g. `2GB of 11GB used`.
#[must_use]
pub fn usage_summary(info: &StorageInfo) -> String {
    format!(
        "{} of {} used",
        format_storage(info.total_storage_used),
        format_storage(info.total_available_storage)
    )
}

/// Share of available storage consumed, in percent (0 to 100).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn usage_percent(info: &StorageInfo) -> f64 {
    if info.total_available_storage == 0 {
        return 100.0;
    }
    let ratio = info.total_storage_used as f64 / info.total_available_storage as f64;
    (ratio * 100.0).min(100.0)
}
