//! Durable queue of mutations captured while offline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::EngineResult;
use crate::models::OfflineQueueItem;
use crate::storage::{DocumentStore, Mutation, SYNC_QUEUE, from_document, to_document};

const QUEUE_DOCUMENT: &str = "pending";

#[derive(Debug, Default, Serialize, Deserialize)]
struct QueueDocument {
    #[serde(default)]
    items: Vec<OfflineQueueItem>,
}

/// Ordered list of updates waiting for the remote store.
///
/// The queue lives in a single document of the local store so that it
/// survives restarts. Items keep their capture order.
pub struct OfflineQueue {
    local: Arc<dyn DocumentStore>,
    lock: Mutex<()>,
}

impl OfflineQueue {
    /// Creates a queue persisted in `local`.
    pub fn new(local: Arc<dyn DocumentStore>) -> Self {
        Self {
            local,
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> EngineResult<QueueDocument> {
        match self.local.get(SYNC_QUEUE, QUEUE_DOCUMENT).await? {
            Some(data) => from_document(data),
            None => Ok(QueueDocument::default()),
        }
    }

    async fn save(&self, document: &QueueDocument) -> EngineResult<()> {
        self.local
            .write(SYNC_QUEUE, QUEUE_DOCUMENT, Mutation::Create(to_document(document)?))
            .await
    }

    /// Appends an item after every item already queued.
    pub async fn push(&self, item: OfflineQueueItem) -> EngineResult<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        document.items.push(item);
        self.save(&document).await
    }

    /// Returns every queued item in capture order.
    pub async fn snapshot(&self) -> EngineResult<Vec<OfflineQueueItem>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.items)
    }

    /// Number of queued items.
    pub async fn len(&self) -> EngineResult<usize> {
        Ok(self.snapshot().await?.len())
    }

    /// Returns true when nothing is queued.
    pub async fn is_empty(&self) -> EngineResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Drops every queued item.
    pub async fn clear(&self) -> EngineResult<()> {
        let _guard = self.lock.lock().await;
        self.save(&QueueDocument::default()).await
    }

    /// Drops the items targeting one document, returning how many were removed.
    pub async fn remove_document(&self, collection: &str, document_id: &str) -> EngineResult<usize> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        let before = document.items.len();
        document
            .items
            .retain(|item| !(item.collection == collection && item.document_id == document_id));
        let removed = before - document.items.len();
        if removed > 0 {
            self.save(&document).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QueueOperation;
    use crate::storage::{MemoryStore, TIME_ENTRIES};
    use chrono::Utc;
    use serde_json::json;

    fn item(document_id: &str, n: u32) -> OfflineQueueItem {
        OfflineQueueItem {
            operation: QueueOperation::Update,
            collection: TIME_ENTRIES.to_string(),
            document_id: document_id.to_string(),
            payload: json!({ "n": n }),
            captured_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_push_preserves_capture_order() {
        let queue = OfflineQueue::new(Arc::new(MemoryStore::new()));
        queue.push(item("e1", 1)).await.unwrap();
        queue.push(item("e2", 2)).await.unwrap();
        queue.push(item("e1", 3)).await.unwrap();

        let items = queue.snapshot().await.unwrap();
        let payloads: Vec<u64> = items
            .iter()
            .map(|i| i.payload["n"].as_u64().unwrap())
            .collect();
        assert_eq!(payloads, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_queue_survives_new_handle() {
        let local: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        OfflineQueue::new(local.clone()).push(item("e1", 1)).await.unwrap();

        let queue = OfflineQueue::new(local);
        assert_eq!(queue.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_document_and_clear() {
        let queue = OfflineQueue::new(Arc::new(MemoryStore::new()));
        queue.push(item("e1", 1)).await.unwrap();
        queue.push(item("e2", 2)).await.unwrap();
        queue.push(item("e1", 3)).await.unwrap();

        assert_eq!(queue.remove_document(TIME_ENTRIES, "e1").await.unwrap(), 2);
        assert_eq!(queue.len().await.unwrap(), 1);

        queue.clear().await.unwrap();
        assert!(queue.is_empty().await.unwrap());
    }
}
