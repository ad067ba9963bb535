//! Durable tag bindings and the "wait for next scan" registration flow.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{TagBinding, normalize_tag_uid};
use crate::storage::{DocumentStore, Mutation, TAG_BINDINGS, from_document, to_document};
use crate::sync::IdMap;

type RegistrationReply = oneshot::Sender<EngineResult<TagBinding>>;

struct PendingRegistration {
    ticket: u64,
    employee_id: String,
    reply: RegistrationReply,
}

/// A registration waiting for its scan.
pub(crate) struct Claimed {
    pub(crate) employee_id: String,
    pub(crate) reply: RegistrationReply,
}

/// Deregisters a pending registration when its waiter goes away.
pub(crate) struct RegistrationGuard<'a> {
    registry: &'a TagRegistry,
    ticket: u64,
}

impl Drop for RegistrationGuard<'_> {
    fn drop(&mut self) {
        let mut pending = self
            .registry
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if pending.as_ref().is_some_and(|p| p.ticket == self.ticket) {
            *pending = None;
            debug!(ticket = self.ticket, "tag registration listener removed");
        }
    }
}

/// Tag to employee associations, persisted in the local store.
pub(crate) struct TagRegistry {
    local: Arc<dyn DocumentStore>,
    bindings: RwLock<BTreeMap<String, TagBinding>>,
    /// Held across every change of `bindings` and its stored copy.
    writes: AsyncMutex<()>,
    pending: Mutex<Option<PendingRegistration>>,
    tickets: AtomicU64,
}

impl TagRegistry {
    pub(crate) async fn load(local: Arc<dyn DocumentStore>) -> EngineResult<Self> {
        let mut bindings = BTreeMap::new();
        for doc in local.list(TAG_BINDINGS).await? {
            let binding: TagBinding = from_document(doc.data)?;
            bindings.insert(binding.tag_uid.clone(), binding);
        }
        Ok(Self {
            local,
            bindings: RwLock::new(bindings),
            writes: AsyncMutex::new(()),
            pending: Mutex::new(None),
            tickets: AtomicU64::new(0),
        })
    }

    pub(crate) fn resolve(&self, tag_uid: &str) -> Option<String> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tag_uid)
            .map(|binding| binding.employee_id.clone())
    }

    pub(crate) fn bindings(&self) -> Vec<TagBinding> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn tags_of(&self, employee_id: &str) -> Vec<String> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|binding| binding.employee_id == employee_id)
            .map(|binding| binding.tag_uid.clone())
            .collect()
    }

    /// Binds a tag, replacing the employee's previous tag.
    ///
    /// Re-binding the same tag to the same employee keeps the original binding.
    pub(crate) async fn bind(&self, binding: TagBinding) -> EngineResult<TagBinding> {
        let tag_uid = normalize_tag_uid(&binding.tag_uid);
        if tag_uid.is_empty() {
            return Err(EngineError::UnknownTag { tag_uid });
        }
        let binding = TagBinding { tag_uid, ..binding };

        let _writes = self.writes.lock().await;
        let existing = self
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&binding.tag_uid)
            .cloned();
        if let Some(existing) = existing {
            if existing.employee_id == binding.employee_id {
                return Ok(existing);
            }
            return Err(EngineError::TagAlreadyBound {
                tag_uid: existing.tag_uid,
                employee_id: existing.employee_id,
            });
        }

        for previous in self.tags_of(&binding.employee_id) {
            self.remove(&previous).await?;
        }

        self.local
            .write(
                TAG_BINDINGS,
                &binding.tag_uid,
                Mutation::Create(to_document(&binding)?),
            )
            .await?;
        self.bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(binding.tag_uid.clone(), binding.clone());
        Ok(binding)
    }

    pub(crate) async fn unbind(&self, tag_uid: &str) -> EngineResult<Option<TagBinding>> {
        let _writes = self.writes.lock().await;
        self.remove(&normalize_tag_uid(tag_uid)).await
    }

    async fn remove(&self, tag_uid: &str) -> EngineResult<Option<TagBinding>> {
        self.local.delete(TAG_BINDINGS, tag_uid).await?;
        Ok(self
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(tag_uid))
    }

    pub(crate) async fn unbind_employee(&self, employee_id: &str) -> EngineResult<usize> {
        let _writes = self.writes.lock().await;
        let tags = self.tags_of(employee_id);
        for tag_uid in &tags {
            self.remove(tag_uid).await?;
        }
        Ok(tags.len())
    }

    /// Points bindings of offline employees at their reconciled ids.
    pub(crate) async fn remap(&self, ids: &IdMap) -> EngineResult<()> {
        let _writes = self.writes.lock().await;
        let stale: Vec<TagBinding> = self
            .bindings()
            .into_iter()
            .filter(|binding| ids.contains_key(&binding.employee_id))
            .collect();

        for mut binding in stale {
            if let Some(remote) = ids.get(&binding.employee_id) {
                binding.employee_id = remote.clone();
            }
            self.local
                .write(
                    TAG_BINDINGS,
                    &binding.tag_uid,
                    Mutation::Create(to_document(&binding)?),
                )
                .await?;
            self.bindings
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(binding.tag_uid.clone(), binding);
        }
        Ok(())
    }

    /// Registers a listener for the next scan, cancelling any earlier one.
    pub(crate) fn begin_registration(
        &self,
        employee_id: &str,
    ) -> (RegistrationGuard<'_>, oneshot::Receiver<EngineResult<TagBinding>>) {
        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);
        let (reply, receiver) = oneshot::channel();

        let replaced = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(PendingRegistration {
                ticket,
                employee_id: employee_id.to_string(),
                reply,
            });
        if let Some(previous) = replaced {
            let _ = previous.reply.send(Err(EngineError::RegistrationCancelled {
                employee_id: previous.employee_id,
            }));
        }

        (
            RegistrationGuard {
                registry: self,
                ticket,
            },
            receiver,
        )
    }

    /// Takes the pending registration, if its waiter is still listening.
    pub(crate) fn claim_pending(&self) -> Option<Claimed> {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        if pending.reply.is_closed() {
            return None;
        }
        Some(Claimed {
            employee_id: pending.employee_id,
            reply: pending.reply,
        })
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::NaiveDateTime;

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn binding(tag_uid: &str, employee_id: &str) -> TagBinding {
        TagBinding {
            tag_uid: tag_uid.to_string(),
            employee_id: employee_id.to_string(),
            registered_at: make_datetime("2026-01-15", "09:00:00"),
        }
    }

    #[tokio::test]
    async fn test_bindings_are_durable() {
        let local: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let registry = TagRegistry::load(local.clone()).await.unwrap();
        registry.bind(binding("04:A2:B9", "emp_001")).await.unwrap();

        let reloaded = TagRegistry::load(local).await.unwrap();
        assert_eq!(reloaded.resolve("04a2b9"), Some("emp_001".to_string()));
    }

    #[tokio::test]
    async fn test_tag_bound_to_other_employee_is_rejected() {
        let registry = TagRegistry::load(Arc::new(MemoryStore::new())).await.unwrap();
        registry.bind(binding("04a2b9", "emp_001")).await.unwrap();

        let result = registry.bind(binding("04A2B9", "emp_002")).await;
        match result {
            Err(EngineError::TagAlreadyBound { tag_uid, employee_id }) => {
                assert_eq!(tag_uid, "04a2b9");
                assert_eq!(employee_id, "emp_001");
            }
            other => panic!("Expected TagAlreadyBound, got {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_binds_of_one_tag_keep_the_first() {
        let registry = Arc::new(TagRegistry::load(Arc::new(MemoryStore::new())).await.unwrap());
        let mut handles = Vec::new();
        for i in 0..8 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.bind(binding("04a2b9", &format!("emp_{:03}", i))).await
            }));
        }

        let mut bound = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(binding) => bound.push(binding.employee_id),
                Err(EngineError::TagAlreadyBound { .. }) => {}
                Err(other) => panic!("Expected TagAlreadyBound, got {:?}", other),
            }
        }
        assert_eq!(bound.len(), 1);
        assert_eq!(registry.resolve("04a2b9"), Some(bound[0].clone()));
    }

    #[tokio::test]
    async fn test_new_tag_replaces_previous_one() {
        let registry = TagRegistry::load(Arc::new(MemoryStore::new())).await.unwrap();
        registry.bind(binding("aaaa", "emp_001")).await.unwrap();
        registry.bind(binding("bbbb", "emp_001")).await.unwrap();

        assert_eq!(registry.resolve("aaaa"), None);
        assert_eq!(registry.resolve("bbbb"), Some("emp_001".to_string()));
        assert_eq!(registry.bindings().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_tag_is_rejected() {
        let registry = TagRegistry::load(Arc::new(MemoryStore::new())).await.unwrap();
        let result = registry.bind(binding(" : ", "emp_001")).await;
        assert!(matches!(result, Err(EngineError::UnknownTag { .. })));
    }

    #[tokio::test]
    async fn test_dropped_guard_removes_listener() {
        let registry = TagRegistry::load(Arc::new(MemoryStore::new())).await.unwrap();
        {
            let (_guard, _receiver) = registry.begin_registration("emp_001");
            assert!(registry.has_pending());
        }
        assert!(!registry.has_pending());
        assert!(registry.claim_pending().is_none());
    }

    #[tokio::test]
    async fn test_newer_registration_cancels_older() {
        let registry = TagRegistry::load(Arc::new(MemoryStore::new())).await.unwrap();
        let (_first_guard, first) = registry.begin_registration("emp_001");
        let (_second_guard, _second) = registry.begin_registration("emp_002");

        let result = first.await.unwrap();
        assert!(matches!(
            result,
            Err(EngineError::RegistrationCancelled { ref employee_id }) if employee_id == "emp_001"
        ));

        // The stale guard must not remove the newer listener.
        drop(_first_guard);
        let claimed = registry.claim_pending().unwrap();
        assert_eq!(claimed.employee_id, "emp_002");
    }

    #[tokio::test]
    async fn test_remap_rewrites_offline_employee() {
        let registry = TagRegistry::load(Arc::new(MemoryStore::new())).await.unwrap();
        registry.bind(binding("cafe", "offline_emp_1234")).await.unwrap();

        let ids = IdMap::from([("offline_emp_1234".to_string(), "1234".to_string())]);
        registry.remap(&ids).await.unwrap();
        assert_eq!(registry.resolve("cafe"), Some("1234".to_string()));
    }
}
