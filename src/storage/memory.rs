//! In-process document store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::{
    BatchWrite, ChangeFeed, Collection, Document, DocumentChange, DocumentStore, Mutation,
    apply_batch, apply_mutation,
};

/// A document store held in memory.
///
/// The connectivity switch makes it stand in for a remote store: while
/// disconnected, every call fails with [`EngineError::Disconnected`].
///
/// # Example
///
/// ```
/// use timeclock_engine::storage::{DocumentStore, MemoryStore, Mutation};
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryStore::new();
/// store.write("employees", "emp_001", Mutation::Create(json!({"name": "Awa"}))).await.unwrap();
///
/// store.set_connected(false);
/// assert!(store.get("employees", "emp_001").await.is_err());
/// # }
/// ```
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    connected: AtomicBool,
    feed: ChangeFeed,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty, connected store.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            connected: AtomicBool::new(true),
            feed: ChangeFeed::default(),
        }
    }

    /// Simulates losing or regaining connectivity.
    pub fn set_connected(&self, connected: bool) {
        debug!(connected, "memory store connectivity changed");
        self.connected.store(connected, Ordering::SeqCst);
    }

    fn ensure_connected(&self) -> EngineResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(EngineError::Disconnected {
                message: "memory store is offline".to_string(),
            })
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn write(&self, collection: &str, id: &str, mutation: Mutation) -> EngineResult<()> {
        self.ensure_connected()?;
        let next = {
            let mut collections = self.collections.write().unwrap_or_else(PoisonError::into_inner);
            let docs = collections.entry(collection.to_string()).or_default();
            let next = apply_mutation(collection, id, docs.get(id), &mutation)?;
            docs.insert(id.to_string(), next.clone());
            next
        };
        self.feed.publish(DocumentChange {
            collection: collection.to_string(),
            id: id.to_string(),
            document: Some(next),
        });
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> EngineResult<Option<Value>> {
        self.ensure_connected()?;
        let collections = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        Ok(collections.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn list(&self, collection: &str) -> EngineResult<Vec<Document>> {
        self.ensure_connected()?;
        let collections = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete(&self, collection: &str, id: &str) -> EngineResult<()> {
        self.ensure_connected()?;
        let removed = {
            let mut collections = self.collections.write().unwrap_or_else(PoisonError::into_inner);
            collections
                .get_mut(collection)
                .and_then(|docs| docs.remove(id))
                .is_some()
        };
        if removed {
            self.feed.publish(DocumentChange {
                collection: collection.to_string(),
                id: id.to_string(),
                document: None,
            });
        }
        Ok(())
    }

    async fn commit_batch(&self, writes: Vec<BatchWrite>) -> EngineResult<()> {
        self.ensure_connected()?;
        let changes = {
            let mut collections = self.collections.write().unwrap_or_else(PoisonError::into_inner);
            let mut working = collections.clone();
            let changes = apply_batch(&mut working, &writes)?;
            *collections = working;
            changes
        };
        for change in changes {
            self.feed.publish(change);
        }
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> broadcast::Receiver<DocumentChange> {
        self.feed.subscribe(collection)
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
