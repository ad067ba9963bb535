//! Document storage back-ends.
//!
//! The engine persists everything as JSON documents grouped in named
//! collections. Both the remote store and the local cache implement
//! [`DocumentStore`], so the replication layer can treat them uniformly:
//!
//! - [`MemoryStore`]: in-process, with a connectivity switch
//! - [`FileStore`]: one JSON file per collection under a directory

mod file;
mod memory;
#[cfg(test)]
pub(crate) mod testing;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::{EngineError, EngineResult};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Collection of employee records.
pub const EMPLOYEES: &str = "employees";
/// Collection of time entries.
pub const TIME_ENTRIES: &str = "timeEntries";
/// Collection of tag bindings, keyed by tag identifier.
pub const TAG_BINDINGS: &str = "tagBindings";
/// Collection holding the offline queue.
pub const SYNC_QUEUE: &str = "syncQueue";
/// Collection holding the last known copy of remote collections.
pub const SNAPSHOTS: &str = "snapshots";

const CHANGE_FEED_CAPACITY: usize = 256;

/// A write against one document.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Set the whole document, creating it if needed.
    Create(Value),
    /// Merge the top-level fields into an existing document.
    Update(Value),
}

/// One write of an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchWrite {
    /// Target collection.
    pub collection: String,
    /// Target document id.
    pub id: String,
    /// The write to apply.
    pub mutation: Mutation,
}

/// A stored document with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document id.
    pub id: String,
    /// Document body.
    pub data: Value,
}

/// Notification of a document written or deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    /// The collection that changed.
    pub collection: String,
    /// The document that changed.
    pub id: String,
    /// New body; `None` when the document was deleted.
    pub document: Option<Value>,
}

/// A JSON document store.
///
/// Remote-backed implementations report an unreachable back-end as
/// [`EngineError::Disconnected`] so callers can fall back to the offline path.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Applies one mutation to a document.
    async fn write(&self, collection: &str, id: &str, mutation: Mutation) -> EngineResult<()>;

    /// Reads one document.
    async fn get(&self, collection: &str, id: &str) -> EngineResult<Option<Value>>;

    /// Reads every document of a collection, ordered by id.
    async fn list(&self, collection: &str) -> EngineResult<Vec<Document>>;

    /// Deletes a document. Deleting a missing document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> EngineResult<()>;

    /// Applies all writes or none of them.
    async fn commit_batch(&self, writes: Vec<BatchWrite>) -> EngineResult<()>;

    /// Subscribes to changes of one collection.
    fn subscribe(&self, collection: &str) -> broadcast::Receiver<DocumentChange>;

    /// Checks whether the back-end is reachable.
    async fn is_connected(&self) -> bool;
}

/// Serializes a record into a document body.
pub fn to_document<T: Serialize>(record: &T) -> EngineResult<Value> {
    Ok(serde_json::to_value(record)?)
}

/// Deserializes a document body into a record.
pub fn from_document<T: DeserializeOwned>(data: Value) -> EngineResult<T> {
    Ok(serde_json::from_value(data)?)
}

type Collection = BTreeMap<String, Value>;

/// Applies a mutation to the current body of a document.
fn apply_mutation(
    collection: &str,
    id: &str,
    existing: Option<&Value>,
    mutation: &Mutation,
) -> EngineResult<Value> {
    match mutation {
        Mutation::Create(data) => Ok(data.clone()),
        Mutation::Update(patch) => {
            let mut current = existing
                .cloned()
                .ok_or_else(|| EngineError::DocumentNotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            match (current.as_object_mut(), patch.as_object()) {
                (Some(fields), Some(changes)) => {
                    for (key, value) in changes {
                        fields.insert(key.clone(), value.clone());
                    }
                    Ok(current)
                }
                _ => Ok(patch.clone()),
            }
        }
    }
}

/// Applies a batch to working copies of the affected collections.
///
/// Returns the changes to publish; on error nothing in `collections` should
/// be kept by the caller.
fn apply_batch(
    collections: &mut HashMap<String, Collection>,
    writes: &[BatchWrite],
) -> EngineResult<Vec<DocumentChange>> {
    let mut changes = Vec::with_capacity(writes.len());
    for write in writes {
        let docs = collections.entry(write.collection.clone()).or_default();
        let next = apply_mutation(&write.collection, &write.id, docs.get(&write.id), &write.mutation)?;
        docs.insert(write.id.clone(), next.clone());
        changes.push(DocumentChange {
            collection: write.collection.clone(),
            id: write.id.clone(),
            document: Some(next),
        });
    }
    Ok(changes)
}

/// Per-collection broadcast of document changes.
#[derive(Default)]
struct ChangeFeed {
    senders: Mutex<HashMap<String, broadcast::Sender<DocumentChange>>>,
}

impl ChangeFeed {
    fn subscribe(&self, collection: &str) -> broadcast::Receiver<DocumentChange> {
        let mut senders = self.senders.lock().unwrap_or_else(PoisonError::into_inner);
        senders
            .entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(CHANGE_FEED_CAPACITY).0)
            .subscribe()
    }

    fn publish(&self, change: DocumentChange) {
        let senders = self.senders.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = senders.get(&change.collection) {
            // No live subscribers is fine.
            let _ = sender.send(change);
        }
    }
}
