//! Replays offline work against the remote store.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Employee, OfflineQueueItem, QueueOperation, SyncReport, SyncState, SyncStatus, TimeEntry,
};
use crate::storage::{BatchWrite, Mutation, TIME_ENTRIES, to_document};

use super::replicator::{IdMap, Replicated, Replicator, SyncPermit};

#[derive(Debug, Clone)]
struct Progress {
    state: SyncState,
    last_sync: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Runs reconciliation and tracks its status.
pub struct Reconciler {
    replicator: Arc<Replicator>,
    progress: Mutex<Progress>,
}

impl Reconciler {
    /// Creates a reconciler for the replicator's stores.
    pub fn new(replicator: Arc<Replicator>) -> Self {
        Self {
            replicator,
            progress: Mutex::new(Progress {
                state: SyncState::Idle,
                last_sync: None,
                last_error: None,
            }),
        }
    }

    fn update_progress(&self, apply: impl FnOnce(&mut Progress)) {
        let mut progress = self.progress.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut progress);
    }

    /// Offline records plus queued updates still to be sent.
    pub async fn pending_count(&self) -> EngineResult<usize> {
        let employees = self.replicator.offline_records::<Employee>().await?.len();
        let entries = self.replicator.offline_records::<TimeEntry>().await?.len();
        let queued = self.replicator.queue().len().await?;
        Ok(employees + entries + queued)
    }

    /// Current status for the "pending sync" indicator.
    pub async fn status(&self) -> EngineResult<SyncStatus> {
        let pending = self.pending_count().await?;
        let progress = self
            .progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Ok(SyncStatus {
            state: progress.state,
            pending,
            last_sync: progress.last_sync,
            last_error: progress.last_error,
        })
    }

    /// Sends every offline record and queued update to the remote store as one batch.
    ///
    /// Offline ids are replaced by their remote ids, and entries pointing at
    /// an offline employee are rewritten to the employee's remote id. Local
    /// copies and the queue are cleared only after the batch commits; on
    /// failure everything is kept and [`EngineError::ReconciliationFailure`]
    /// is returned. Running it again after a failure sends the same writes
    /// to the same ids, so no duplicate is created.
    pub async fn reconcile(&self, _permit: &SyncPermit<'_>) -> EngineResult<SyncReport> {
        let queued = self.replicator.queue().snapshot().await?;
        let employees = self.replicator.offline_records::<Employee>().await?;
        let entries = self.replicator.offline_records::<TimeEntry>().await?;

        if queued.is_empty() && employees.is_empty() && entries.is_empty() {
            self.update_progress(|p| {
                p.state = SyncState::Succeeded;
                p.last_sync = Some(Utc::now());
                p.last_error = None;
            });
            return Ok(SyncReport::default());
        }

        self.update_progress(|p| p.state = SyncState::Syncing);

        let mut ids = IdMap::new();
        register_ids(&employees, &mut ids);
        register_ids(&entries, &mut ids);

        let mut writes = Vec::with_capacity(employees.len() + entries.len() + queued.len());
        stage_creates(&employees, &ids, &mut writes)?;
        stage_creates(&entries, &ids, &mut writes)?;
        stage_updates(&queued, &ids, &mut writes);

        info!(
            employees = employees.len(),
            entries = entries.len(),
            updates = queued.len(),
            "committing reconciliation batch"
        );

        if let Err(error) = self.replicator.remote().commit_batch(writes).await {
            warn!(error = %error, "reconciliation batch failed, keeping offline data");
            let message = error.to_string();
            self.update_progress(|p| {
                p.state = SyncState::Failed;
                p.last_error = Some(message.clone());
            });
            return Err(EngineError::ReconciliationFailure { message });
        }

        if let Err(error) = self.discard_local(&employees, &entries, &queued).await {
            warn!(error = %error, "batch committed but local cleanup failed");
            self.update_progress(|p| {
                p.state = SyncState::Failed;
                p.last_error = Some(error.to_string());
            });
            return Err(error);
        }

        self.update_progress(|p| {
            p.state = SyncState::Succeeded;
            p.last_sync = Some(Utc::now());
            p.last_error = None;
        });

        let report = SyncReport {
            created_employees: employees.len(),
            created_entries: entries.len(),
            replayed_updates: queued.len(),
            remapped_ids: ids,
        };
        info!(
            created_employees = report.created_employees,
            created_entries = report.created_entries,
            replayed_updates = report.replayed_updates,
            "reconciliation succeeded"
        );
        Ok(report)
    }

    async fn discard_local(
        &self,
        employees: &[Employee],
        entries: &[TimeEntry],
        queued: &[OfflineQueueItem],
    ) -> EngineResult<()> {
        let local = self.replicator.local();
        for employee in employees {
            local.delete(Employee::COLLECTION, &employee.id).await?;
        }
        for entry in entries {
            local.delete(TimeEntry::COLLECTION, &entry.id).await?;
        }
        for item in queued {
            local.delete(&item.collection, &item.document_id).await?;
        }
        self.replicator.queue().clear().await
    }
}

fn register_ids<T: Replicated>(records: &[T], ids: &mut IdMap) {
    for record in records {
        ids.insert(record.id().to_string(), T::remote_id(record.id()));
    }
}

fn stage_creates<T: Replicated>(
    records: &[T],
    ids: &IdMap,
    writes: &mut Vec<BatchWrite>,
) -> EngineResult<()> {
    for record in records {
        let mut record = record.clone();
        let remote_id = T::remote_id(record.id());
        record.set_id(remote_id.clone());
        record.rewrite_references(ids);
        writes.push(BatchWrite {
            collection: T::COLLECTION.to_string(),
            id: remote_id,
            mutation: Mutation::Create(to_document(&record)?),
        });
    }
    Ok(())
}

fn stage_updates(queued: &[OfflineQueueItem], ids: &IdMap, writes: &mut Vec<BatchWrite>) {
    for item in queued {
        let mut payload = item.payload.clone();
        if item.collection == TIME_ENTRIES {
            if let Some(Value::String(employee_id)) = payload.get_mut("employee_id") {
                if let Some(remote) = ids.get(employee_id.as_str()) {
                    *employee_id = remote.clone();
                }
            }
        }
        let mutation = match item.operation {
            QueueOperation::Create => Mutation::Create(payload),
            QueueOperation::Update => Mutation::Update(payload),
        };
        writes.push(BatchWrite {
            collection: item.collection.clone(),
            id: item.document_id.clone(),
            mutation,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DocumentStore, EMPLOYEES, MemoryStore, from_document};
    use chrono::NaiveDateTime;

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn setup() -> (Arc<MemoryStore>, Arc<Replicator>, Reconciler) {
        let remote = Arc::new(MemoryStore::new());
        let local = Arc::new(MemoryStore::new());
        let replicator = Arc::new(Replicator::new(remote.clone(), local));
        let reconciler = Reconciler::new(replicator.clone());
        (remote, replicator, reconciler)
    }

    #[tokio::test]
    async fn test_offline_entry_is_created_once() {
        let (remote, replicator, reconciler) = setup();
        remote.set_connected(false);
        let mut entry = TimeEntry::open("emp_001", make_datetime("2026-01-15", "09:00:00"));
        replicator.create(&mut entry).await.unwrap();
        assert_eq!(reconciler.pending_count().await.unwrap(), 1);

        remote.set_connected(true);
        let permit = replicator.exclusive().await;
        let report = reconciler.reconcile(&permit).await.unwrap();
        assert_eq!(report.created_entries, 1);

        let remote_id = TimeEntry::remote_id(&entry.id);
        assert_eq!(report.remapped_ids.get(&entry.id), Some(&remote_id));
        let docs = remote.list(TIME_ENTRIES).await.unwrap();
        assert_eq!(docs.len(), 1);
        let stored: TimeEntry = from_document(docs[0].data.clone()).unwrap();
        assert_eq!(stored.id, remote_id);
        assert_eq!(stored.start_time, entry.start_time);

        // Nothing left to send
        let again = reconciler.reconcile(&permit).await.unwrap();
        assert!(again.is_empty());
        assert_eq!(remote.list(TIME_ENTRIES).await.unwrap().len(), 1);
        assert_eq!(reconciler.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_batch_keeps_everything() {
        let (remote, replicator, reconciler) = setup();
        remote.set_connected(false);
        let mut entry = TimeEntry::open("emp_001", make_datetime("2026-01-15", "09:00:00"));
        replicator.create(&mut entry).await.unwrap();

        {
            let permit = replicator.exclusive().await;
            let result = reconciler.reconcile(&permit).await;
            assert!(matches!(result, Err(EngineError::ReconciliationFailure { .. })));
        }

        let status = reconciler.status().await.unwrap();
        assert_eq!(status.state, SyncState::Failed);
        assert_eq!(status.pending, 1);
        assert!(status.last_error.is_some());

        remote.set_connected(true);
        let permit = replicator.exclusive().await;
        reconciler.reconcile(&permit).await.unwrap();
        assert_eq!(remote.list(TIME_ENTRIES).await.unwrap().len(), 1);
        let status = reconciler.status().await.unwrap();
        assert_eq!(status.state, SyncState::Succeeded);
        assert!(status.last_sync.is_some());
    }

    #[tokio::test]
    async fn test_entries_of_offline_employee_are_rewritten() {
        let (remote, replicator, reconciler) = setup();
        remote.set_connected(false);

        let mut employee: Employee = serde_json::from_str(r#"{"name": "Awa"}"#).unwrap();
        replicator.create(&mut employee).await.unwrap();
        assert!(employee.is_offline());

        let mut entry = TimeEntry::open(employee.id.clone(), make_datetime("2026-01-15", "09:00:00"));
        replicator.create(&mut entry).await.unwrap();

        remote.set_connected(true);
        let permit = replicator.exclusive().await;
        let report = reconciler.reconcile(&permit).await.unwrap();
        assert_eq!(report.created_employees, 1);
        assert_eq!(report.created_entries, 1);

        let employees = remote.list(EMPLOYEES).await.unwrap();
        let entries = remote.list(TIME_ENTRIES).await.unwrap();
        let stored: TimeEntry = from_document(entries[0].data.clone()).unwrap();
        assert_eq!(stored.employee_id, employees[0].id);
        assert!(!stored.employee_id.starts_with("offline_"));
    }

    #[tokio::test]
    async fn test_queued_updates_replay_in_order() {
        let (remote, replicator, reconciler) = setup();
        let mut entry = TimeEntry::open("emp_001", make_datetime("2026-01-15", "09:00:00"));
        replicator.create(&mut entry).await.unwrap();

        remote.set_connected(false);
        entry.begin_break(make_datetime("2026-01-15", "12:00:00"));
        replicator.update(&entry).await.unwrap();
        entry.finish_break(make_datetime("2026-01-15", "12:30:00"));
        entry.close(make_datetime("2026-01-15", "17:00:00"));
        replicator.update(&entry).await.unwrap();

        remote.set_connected(true);
        let permit = replicator.exclusive().await;
        let report = reconciler.reconcile(&permit).await.unwrap();
        assert_eq!(report.replayed_updates, 2);

        let stored: TimeEntry =
            from_document(remote.get(TIME_ENTRIES, &entry.id).await.unwrap().unwrap()).unwrap();
        assert_eq!(stored, entry);
        assert!(replicator.local().list(TIME_ENTRIES).await.unwrap().is_empty());
    }
}
