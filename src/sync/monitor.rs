//! Connectivity tracking and automatic reconciliation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::EngineResult;
use crate::models::SyncReport;
use crate::storage::DocumentStore;

/// Something that can replay offline work on demand.
#[async_trait]
pub trait Reconcile: Send + Sync {
    /// Runs one reconciliation.
    async fn reconcile(&self) -> EngineResult<SyncReport>;
}

/// Publishes connectivity and reconciles whenever it comes back.
pub struct ConnectivityMonitor {
    state: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    /// Creates a monitor starting in the given state.
    pub fn new(connected: bool) -> Self {
        let (state, _) = watch::channel(connected);
        Self { state }
    }

    /// Records the latest connectivity observation.
    pub fn report(&self, connected: bool) {
        let changed = self.state.send_if_modified(|current| {
            if *current == connected {
                false
            } else {
                *current = connected;
                true
            }
        });
        if changed {
            info!(connected, "remote store connectivity changed");
        }
    }

    /// The last reported state.
    pub fn is_connected(&self) -> bool {
        *self.state.borrow()
    }

    /// Watches connectivity changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    /// Spawns a task that reconciles on every absent to present transition.
    ///
    /// A failed run is logged; the next transition retries it.
    pub fn spawn<R: Reconcile + 'static>(&self, target: Arc<R>) -> JoinHandle<()> {
        let mut changes = self.state.subscribe();
        tokio::spawn(async move {
            let mut was_connected = *changes.borrow_and_update();
            while changes.changed().await.is_ok() {
                let connected = *changes.borrow_and_update();
                if connected && !was_connected {
                    match target.reconcile().await {
                        Ok(report) if report.is_empty() => debug!("reconnected, nothing to sync"),
                        Ok(report) => info!(
                            created_entries = report.created_entries,
                            replayed_updates = report.replayed_updates,
                            "reconciled after reconnect"
                        ),
                        Err(error) => warn!(error = %error, "reconciliation after reconnect failed"),
                    }
                }
                was_connected = connected;
            }
        })
    }

    /// Spawns a task polling `store` every `interval` and reporting the result.
    pub fn spawn_probe(
        self: &Arc<Self>,
        store: Arc<dyn DocumentStore>,
        interval: Duration,
    ) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                monitor.report(store.is_connected().await);
            }
        })
    }
}
