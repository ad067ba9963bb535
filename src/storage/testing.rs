//! Store wrappers for exercising failure paths in tests.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::{EngineError, EngineResult};

use super::{BatchWrite, Document, DocumentChange, DocumentStore, MemoryStore, Mutation, SNAPSHOTS};

/// A memory store whose snapshot writes fail once switched on, like a full disk.
pub(crate) struct FailingSnapshots {
    inner: MemoryStore,
    failing: AtomicBool,
}

impl FailingSnapshots {
    pub(crate) fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            failing: AtomicBool::new(false),
        }
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self, collection: &str) -> EngineResult<()> {
        if collection == SNAPSHOTS && self.failing.load(Ordering::SeqCst) {
            return Err(EngineError::storage("disk full"));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FailingSnapshots {
    async fn write(&self, collection: &str, id: &str, mutation: Mutation) -> EngineResult<()> {
        self.check(collection)?;
        self.inner.write(collection, id, mutation).await
    }

    async fn get(&self, collection: &str, id: &str) -> EngineResult<Option<Value>> {
        self.inner.get(collection, id).await
    }

    async fn list(&self, collection: &str) -> EngineResult<Vec<Document>> {
        self.inner.list(collection).await
    }

    async fn delete(&self, collection: &str, id: &str) -> EngineResult<()> {
        self.check(collection)?;
        self.inner.delete(collection, id).await
    }

    async fn commit_batch(&self, writes: Vec<BatchWrite>) -> EngineResult<()> {
        for write in &writes {
            self.check(&write.collection)?;
        }
        self.inner.commit_batch(writes).await
    }

    fn subscribe(&self, collection: &str) -> broadcast::Receiver<DocumentChange> {
        self.inner.subscribe(collection)
    }

    async fn is_connected(&self) -> bool {
        self.inner.is_connected().await
    }
}
