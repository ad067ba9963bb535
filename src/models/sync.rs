//! Offline queue and reconciliation status models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a buffered mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueOperation {
    /// Create (or overwrite) the whole document.
    Create,
    /// Merge the payload into an existing document.
    Update,
}

/// A mutation that could not reach the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineQueueItem {
    /// Create or update.
    pub operation: QueueOperation,
    /// Target collection.
    pub collection: String,
    /// Target document id on the remote store.
    pub document_id: String,
    /// Document body or field patch.
    pub payload: Value,
    /// When the mutation was captured.
    pub captured_at: DateTime<Utc>,
}

/// Progress of the reconciliation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Nothing has run yet.
    Idle,
    /// A batch is being committed.
    Syncing,
    /// The last batch committed.
    Succeeded,
    /// The last batch failed; everything was retained.
    Failed,
}

/// Snapshot for the "pending sync" indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Current progress.
    pub state: SyncState,
    /// Offline records plus queued updates awaiting reconciliation.
    pub pending: usize,
    /// Last successful reconciliation.
    pub last_sync: Option<DateTime<Utc>>,
    /// Error of the last failed attempt.
    pub last_error: Option<String>,
}

/// Summary of one successful reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Offline-created employees written to the remote store.
    pub created_employees: usize,
    /// Offline-created time entries written to the remote store.
    pub created_entries: usize,
    /// Queued mutations replayed against existing documents.
    pub replayed_updates: usize,
    /// Local ids replaced by their remote ids.
    pub remapped_ids: BTreeMap<String, String>,
}

impl SyncReport {
    /// Returns true when the run had nothing to send.
    pub fn is_empty(&self) -> bool {
        self.created_employees == 0 && self.created_entries == 0 && self.replayed_updates == 0
    }
}
