//! Write-through replication with an offline fallback.
//!
//! Every mutation first goes to the remote store. When the remote store
//! reports [`EngineError::Disconnected`], the record is kept in the local
//! store instead: creates get an offline id, updates are queued and a local
//! shadow copy serves reads until reconciliation.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Employee, OFFLINE_EMPLOYEE_PREFIX, OFFLINE_ENTRY_PREFIX, OfflineQueueItem, QueueOperation,
    TimeEntry,
};
use crate::storage::{
    DocumentStore, EMPLOYEES, Mutation, SNAPSHOTS, TIME_ENTRIES, from_document, to_document,
};

use super::queue::OfflineQueue;

/// Offline ids mapped to the remote ids that replace them.
pub type IdMap = BTreeMap<String, String>;

/// A record kind the replicator can store remotely or offline.
pub trait Replicated: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection the records live in.
    const COLLECTION: &'static str;
    /// Id prefix marking a record created offline.
    const OFFLINE_PREFIX: &'static str;

    /// The record id.
    fn id(&self) -> &str;

    /// Replaces the record id.
    fn set_id(&mut self, id: String);

    /// Rewrites ids of other records this one refers to.
    fn rewrite_references(&mut self, _ids: &IdMap) {}

    /// Returns true when the record refers to another record that only
    /// exists offline. Such a record cannot reach the remote store before
    /// reconciliation assigns the remote id.
    fn references_offline(&self) -> bool {
        false
    }

    /// Returns true when `id` was assigned offline.
    fn is_offline_id(id: &str) -> bool {
        id.starts_with(Self::OFFLINE_PREFIX)
    }

    /// The remote id an offline id is reconciled to.
    ///
    /// Offline ids are the prefix followed by a fresh uuid, so stripping the
    /// prefix gives the same remote id on every reconciliation attempt.
    fn remote_id(id: &str) -> String {
        id.strip_prefix(Self::OFFLINE_PREFIX).unwrap_or(id).to_string()
    }
}

impl Replicated for TimeEntry {
    const COLLECTION: &'static str = TIME_ENTRIES;
    const OFFLINE_PREFIX: &'static str = OFFLINE_ENTRY_PREFIX;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn rewrite_references(&mut self, ids: &IdMap) {
        if let Some(remote) = ids.get(&self.employee_id) {
            self.employee_id = remote.clone();
        }
    }

    fn references_offline(&self) -> bool {
        Employee::is_offline_id(&self.employee_id)
    }
}

impl Replicated for Employee {
    const COLLECTION: &'static str = EMPLOYEES;
    const OFFLINE_PREFIX: &'static str = OFFLINE_EMPLOYEE_PREFIX;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Where a mutation ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Written to the remote store.
    Remote,
    /// Remote store unreachable; the update is queued for reconciliation.
    Queued,
    /// Stored locally only, as an offline record.
    Local,
}

impl WriteOutcome {
    /// Returns true when the change still has to reach the remote store.
    pub fn is_pending(self) -> bool {
        self != WriteOutcome::Remote
    }
}

/// Exclusive access for reconciliation; no mutation runs while it is held.
pub struct SyncPermit<'a> {
    _guard: RwLockWriteGuard<'a, ()>,
}

/// Routes record writes to the remote store, falling back to local storage.
pub struct Replicator {
    remote: Arc<dyn DocumentStore>,
    local: Arc<dyn DocumentStore>,
    queue: OfflineQueue,
    gate: RwLock<()>,
}

impl Replicator {
    /// Creates a replicator over a remote store and a local store.
    pub fn new(remote: Arc<dyn DocumentStore>, local: Arc<dyn DocumentStore>) -> Self {
        Self {
            queue: OfflineQueue::new(local.clone()),
            remote,
            local,
            gate: RwLock::new(()),
        }
    }

    /// The remote store.
    pub fn remote(&self) -> &Arc<dyn DocumentStore> {
        &self.remote
    }

    /// The local store.
    pub fn local(&self) -> &Arc<dyn DocumentStore> {
        &self.local
    }

    /// The offline queue.
    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    /// Shared access held by every mutation. Must be taken before any employee lock.
    pub async fn hold(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read().await
    }

    /// Waits for in-flight mutations to finish and blocks new ones.
    pub async fn exclusive(&self) -> SyncPermit<'_> {
        SyncPermit {
            _guard: self.gate.write().await,
        }
    }

    /// Persists a new record, assigning its id.
    ///
    /// A record referring to an offline record is kept offline too, even
    /// when the remote store is reachable.
    pub async fn create<T: Replicated>(&self, record: &mut T) -> EngineResult<WriteOutcome> {
        let key = Uuid::new_v4().to_string();
        record.set_id(key.clone());

        if record.references_offline() {
            debug!(collection = T::COLLECTION, "record refers to an offline record, created offline");
            return self.create_offline(record, &key).await;
        }

        let document = to_document(record)?;
        match self
            .remote
            .write(T::COLLECTION, &key, Mutation::Create(document.clone()))
            .await
        {
            Ok(()) => {
                self.refresh_snapshot(T::COLLECTION, &key, Some(document)).await;
                Ok(WriteOutcome::Remote)
            }
            Err(error) if error.is_disconnected() => {
                warn!(
                    collection = T::COLLECTION,
                    error = %error,
                    "remote store unreachable, creating offline record"
                );
                self.create_offline(record, &key).await
            }
            Err(error) => Err(error),
        }
    }

    async fn create_offline<T: Replicated>(&self, record: &mut T, key: &str) -> EngineResult<WriteOutcome> {
        record.set_id(format!("{}{}", T::OFFLINE_PREFIX, key));
        self.local
            .write(T::COLLECTION, record.id(), Mutation::Create(to_document(record)?))
            .await?;
        debug!(collection = T::COLLECTION, id = record.id(), "offline record stored");
        Ok(WriteOutcome::Local)
    }

    /// Persists the new state of an existing record.
    ///
    /// Offline records are updated in place. A record that already has a
    /// queued update keeps queueing, so replay order matches capture order.
    pub async fn update<T: Replicated>(&self, record: &T) -> EngineResult<WriteOutcome> {
        let id = record.id();
        let document = to_document(record)?;

        if T::is_offline_id(id) {
            self.local
                .write(T::COLLECTION, id, Mutation::Create(document))
                .await?;
            return Ok(WriteOutcome::Local);
        }

        if self.local.get(T::COLLECTION, id).await?.is_some() {
            debug!(collection = T::COLLECTION, id, "record has pending updates, queueing");
            return self.queue_update::<T>(id, document).await;
        }

        if record.references_offline() {
            debug!(collection = T::COLLECTION, id, "record refers to an offline record, queueing");
            return self.queue_update::<T>(id, document).await;
        }

        match self
            .remote
            .write(T::COLLECTION, id, Mutation::Update(document.clone()))
            .await
        {
            Ok(()) => {
                self.refresh_snapshot(T::COLLECTION, id, Some(document)).await;
                Ok(WriteOutcome::Remote)
            }
            Err(error) if error.is_disconnected() => {
                warn!(
                    collection = T::COLLECTION,
                    id,
                    error = %error,
                    "remote store unreachable, queued update"
                );
                self.queue_update::<T>(id, document).await
            }
            Err(error) => Err(error),
        }
    }

    async fn queue_update<T: Replicated>(&self, id: &str, document: Value) -> EngineResult<WriteOutcome> {
        self.local
            .write(T::COLLECTION, id, Mutation::Create(document.clone()))
            .await?;
        self.queue
            .push(OfflineQueueItem {
                operation: QueueOperation::Update,
                collection: T::COLLECTION.to_string(),
                document_id: id.to_string(),
                payload: document,
                captured_at: Utc::now(),
            })
            .await?;
        Ok(WriteOutcome::Queued)
    }

    /// Deletes a record.
    ///
    /// Offline records are dropped locally. Other records need the remote
    /// store; `Disconnected` is returned when it is unreachable.
    pub async fn delete<T: Replicated>(&self, id: &str) -> EngineResult<()> {
        if T::is_offline_id(id) {
            return self.local.delete(T::COLLECTION, id).await;
        }

        self.remote.delete(T::COLLECTION, id).await?;
        self.refresh_snapshot(T::COLLECTION, id, None).await;
        self.local.delete(T::COLLECTION, id).await?;
        let dropped = self.queue.remove_document(T::COLLECTION, id).await?;
        if dropped > 0 {
            debug!(collection = T::COLLECTION, id, dropped, "dropped queued updates of deleted record");
        }
        Ok(())
    }

    /// Loads every record: the remote collection (or its last known copy
    /// when unreachable) overlaid with local offline records and shadows.
    pub async fn load_all<T: Replicated>(&self) -> EngineResult<Vec<T>> {
        let mut documents: BTreeMap<String, Value> = match self.remote.list(T::COLLECTION).await {
            Ok(docs) => {
                let documents: BTreeMap<String, Value> =
                    docs.into_iter().map(|d| (d.id, d.data)).collect();
                self.save_snapshot(T::COLLECTION, &documents).await?;
                documents
            }
            Err(error) if error.is_disconnected() => {
                debug!(collection = T::COLLECTION, "remote store unreachable, using last snapshot");
                self.load_snapshot(T::COLLECTION).await?
            }
            Err(error) => return Err(error),
        };

        for doc in self.local.list(T::COLLECTION).await? {
            documents.insert(doc.id, doc.data);
        }

        documents.into_values().map(from_document).collect()
    }

    /// Local records created offline and not yet reconciled.
    pub async fn offline_records<T: Replicated>(&self) -> EngineResult<Vec<T>> {
        self.local
            .list(T::COLLECTION)
            .await?
            .into_iter()
            .filter(|doc| T::is_offline_id(&doc.id))
            .map(|doc| from_document(doc.data))
            .collect()
    }

    async fn save_snapshot(&self, collection: &str, documents: &BTreeMap<String, Value>) -> EngineResult<()> {
        self.local
            .write(
                SNAPSHOTS,
                collection,
                Mutation::Create(json!({ "documents": documents })),
            )
            .await
    }

    /// Keeps the last known copy in step with a write the remote store accepted.
    ///
    /// The remote write already happened, so a failure here only leaves the
    /// offline copy stale until the next full load.
    async fn refresh_snapshot(&self, collection: &str, id: &str, document: Option<Value>) {
        if let Err(error) = self.patch_snapshot(collection, id, document).await {
            warn!(collection, id, error = %error, "failed to update the last known copy");
        }
    }

    async fn patch_snapshot(&self, collection: &str, id: &str, document: Option<Value>) -> EngineResult<()> {
        let mut documents = self.load_snapshot(collection).await?;
        match document {
            Some(document) => documents.insert(id.to_string(), document),
            None => documents.remove(id),
        };
        self.save_snapshot(collection, &documents).await
    }

    async fn load_snapshot(&self, collection: &str) -> EngineResult<BTreeMap<String, Value>> {
        let Some(mut snapshot) = self.local.get(SNAPSHOTS, collection).await? else {
            return Ok(BTreeMap::new());
        };
        match snapshot.get_mut("documents").map(Value::take) {
            Some(documents) => from_document(documents),
            None => Err(EngineError::storage(format!("malformed snapshot of {}", collection))),
        }
    }
}
