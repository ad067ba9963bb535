//! Durable JSON file store.
//!
//! Each collection is kept as one pretty-printed JSON object mapping
//! document ids to bodies, at `<root>/<collection>.json`. Files are replaced
//! by writing a temporary sibling and renaming it over the original, so a
//! reader never sees a half-written collection.

use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};

use super::{
    BatchWrite, ChangeFeed, Collection, Document, DocumentChange, DocumentStore, Mutation,
    apply_batch, apply_mutation,
};

/// A document store backed by JSON files in a directory.
///
/// Opened with [`FileStore::open`] it is the device's local persistence and
/// creates its directory. Opened with [`FileStore::mounted`] it stands for a
/// shared remote directory: when the directory is unavailable every call
/// fails with [`EngineError::Disconnected`].
pub struct FileStore {
    root: PathBuf,
    mounted: bool,
    write_lock: Mutex<()>,
    feed: ChangeFeed,
}

impl FileStore {
    /// Opens a local store, creating the directory when needed.
    pub async fn open(root: impl Into<PathBuf>) -> EngineResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            EngineError::storage(format!("cannot create {}: {}", root.display(), e))
        })?;
        debug!(root = %root.display(), "opened local file store");
        Ok(Self {
            root,
            mounted: false,
            write_lock: Mutex::new(()),
            feed: ChangeFeed::default(),
        })
    }

    /// Uses a mounted directory as a remote store. The directory is not created.
    pub fn mounted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mounted: true,
            write_lock: Mutex::new(()),
            feed: ChangeFeed::default(),
        }
    }

    /// The directory holding the collection files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{}.json", collection))
    }

    fn io_error(&self, action: &str, path: &Path, error: io::Error) -> EngineError {
        let message = format!("cannot {} {}: {}", action, path.display(), error);
        if self.mounted {
            EngineError::Disconnected { message }
        } else {
            EngineError::storage(message)
        }
    }

    async fn ensure_available(&self) -> EngineResult<()> {
        if !self.mounted {
            return Ok(());
        }
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            _ => Err(EngineError::Disconnected {
                message: format!("{} is not available", self.root.display()),
            }),
        }
    }

    async fn read_collection(&self, collection: &str) -> EngineResult<Collection> {
        let path = self.collection_path(collection);
        match fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Collection::new()),
            Err(e) => Err(self.io_error("read", &path, e)),
        }
    }

    async fn write_collection(&self, collection: &str, docs: &Collection) -> EngineResult<()> {
        let path = self.collection_path(collection);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(docs)?;
        fs::write(&tmp, bytes)
            .await
            .map_err(|e| self.io_error("write", &tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            warn!(path = %path.display(), error = %e, "failed to replace collection file");
            return Err(self.io_error("replace", &path, e));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn write(&self, collection: &str, id: &str, mutation: Mutation) -> EngineResult<()> {
        self.ensure_available().await?;
        let _guard = self.write_lock.lock().await;
        let mut docs = self.read_collection(collection).await?;
        let next = apply_mutation(collection, id, docs.get(id), &mutation)?;
        docs.insert(id.to_string(), next.clone());
        self.write_collection(collection, &docs).await?;
        self.feed.publish(DocumentChange {
            collection: collection.to_string(),
            id: id.to_string(),
            document: Some(next),
        });
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> EngineResult<Option<Value>> {
        self.ensure_available().await?;
        let mut docs = self.read_collection(collection).await?;
        Ok(docs.remove(id))
    }

    async fn list(&self, collection: &str) -> EngineResult<Vec<Document>> {
        self.ensure_available().await?;
        let docs = self.read_collection(collection).await?;
        Ok(docs
            .into_iter()
            .map(|(id, data)| Document { id, data })
            .collect())
    }

    async fn delete(&self, collection: &str, id: &str) -> EngineResult<()> {
        self.ensure_available().await?;
        let _guard = self.write_lock.lock().await;
        let mut docs = self.read_collection(collection).await?;
        if docs.remove(id).is_none() {
            return Ok(());
        }
        self.write_collection(collection, &docs).await?;
        self.feed.publish(DocumentChange {
            collection: collection.to_string(),
            id: id.to_string(),
            document: None,
        });
        Ok(())
    }

    /// Validates the whole batch in memory before replacing any file.
    async fn commit_batch(&self, writes: Vec<BatchWrite>) -> EngineResult<()> {
        self.ensure_available().await?;
        let _guard = self.write_lock.lock().await;

        let touched: BTreeSet<&str> = writes.iter().map(|w| w.collection.as_str()).collect();
        let mut working: HashMap<String, Collection> = HashMap::new();
        for collection in &touched {
            working.insert(collection.to_string(), self.read_collection(collection).await?);
        }

        let changes = apply_batch(&mut working, &writes)?;
        for collection in &touched {
            if let Some(docs) = working.get(*collection) {
                self.write_collection(collection, docs).await?;
            }
        }
        for change in changes {
            self.feed.publish(change);
        }
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> broadcast::Receiver<DocumentChange> {
        self.feed.subscribe(collection)
    }

    async fn is_connected(&self) -> bool {
        self.ensure_available().await.is_ok()
    }
}
