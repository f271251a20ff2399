//! Storage-updated notifications.
//!
//! A purchase (or anything else that changes a wallet's quota) calls
//! `StorageEvents::notify`. Views hold a `StorageSubscription` for as long
//! as they are mounted and refresh when it fires. Dropping the
//! subscription unsubscribes.

use std::sync::Arc;

use tokio::sync::watch;

/// Broadcasts payload-free "storage updated" signals.
#[derive(Debug, Clone)]
pub struct StorageEvents {
    tx: Arc<watch::Sender<u64>>,
}

impl StorageEvents {
    /// Create an event bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to future notifications.
    ///
    /// Signals sent before this call are not delivered.
    #[must_use]
    pub fn subscribe(&self) -> StorageSubscription {
        StorageSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Signal every live subscriber that storage totals changed.
    pub fn notify(&self) {
        self.tx.send_modify(|generation| *generation = generation.wrapping_add(1));
        tracing::debug!(subscribers = self.tx.receiver_count(), "Storage updated");
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for StorageEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription to storage-updated signals.
///
/// Several signals arriving before the holder wakes are coalesced into one.
#[derive(Debug)]
pub struct StorageSubscription {
    rx: watch::Receiver<u64>,
}

impl StorageSubscription {
    /// Wait for the next signal.
    ///
    /// Returns `false` once every `StorageEvents` handle is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Whether a signal arrived that has not been consumed by `changed`.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}
