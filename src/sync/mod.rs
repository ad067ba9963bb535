//! Offline replication and reconciliation.
//!
//! Mutations go through the [`Replicator`], which writes to the remote store
//! and falls back to local storage plus the [`OfflineQueue`] when the remote
//! store is unreachable. The [`Reconciler`] later replays that work as one
//! atomic batch, and the [`ConnectivityMonitor`] triggers it when
//! connectivity returns.

mod monitor;
mod queue;
mod reconciler;
mod replicator;

pub use monitor::{ConnectivityMonitor, Reconcile};
pub use queue::OfflineQueue;
pub use reconciler::Reconciler;
pub use replicator::{IdMap, Replicated, Replicator, SyncPermit, WriteOutcome};
