//! The attendance engine.
//!
//! [`AttendanceEngine`] owns the per-employee state machine
//! (`Absent -> Active <-> OnBreak -> Absent`), the time entry collection,
//! tag bindings and the event bus. Every mutation runs under the
//! replication gate and, for attendance changes, under the employee's
//! lock, so a UI click racing a badge tap for the same employee is
//! applied one after the other.

mod locks;
mod tags;

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::calculation;
use crate::config::Settings;
use crate::directory::EmployeeDirectory;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceEvent, AttendanceState, ClockAction, ClockNotice, Employee, EmployeeStats,
    EmployeeUpdate, NewEmployee, Operation, RegisterRow, ReportPeriod, ScanDisposition, ScanEvent,
    ScanOutcome, SyncReport, SyncStatus, TagBinding, TimeEntry, WeeklyStats, normalize_tag_uid,
};
use crate::storage::DocumentStore;
use crate::sync::{IdMap, Reconcile, Reconciler, Replicated, Replicator};

use locks::EmployeeLocks;
use tags::TagRegistry;

const EVENT_CAPACITY: usize = 64;

/// Administrative correction of a time entry; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryEdit {
    /// New clock-in time.
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    /// New clock-out time. `Some(None)` (an explicit `null`) reopens the shift.
    #[serde(default, deserialize_with = "present")]
    pub end_time: Option<Option<NaiveDateTime>>,
    /// New notes.
    #[serde(default)]
    pub notes: Option<String>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Records shifts and breaks, resolves badge taps and publishes attendance events.
pub struct AttendanceEngine {
    replicator: Arc<Replicator>,
    reconciler: Reconciler,
    directory: EmployeeDirectory,
    tags: TagRegistry,
    entries: RwLock<BTreeMap<String, TimeEntry>>,
    locks: EmployeeLocks,
    events: broadcast::Sender<AttendanceEvent>,
    registration_timeout: Duration,
}

impl AttendanceEngine {
    /// Opens the engine over a remote store and a local store.
    ///
    /// Employees, time entries and tag bindings are loaded up front. When
    /// the remote store is unreachable the last known copy is used, overlaid
    /// with everything recorded offline.
    ///
    /// # Arguments
    ///
    /// * `remote` - The shared document store
    /// * `local` - Durable local storage for offline copies, the queue and tag bindings
    /// * `settings` - Attendance policy defaults
    pub async fn open(
        remote: Arc<dyn DocumentStore>,
        local: Arc<dyn DocumentStore>,
        settings: &Settings,
    ) -> EngineResult<Self> {
        let replicator = Arc::new(Replicator::new(remote, local.clone()));
        let directory = EmployeeDirectory::load(
            replicator.clone(),
            settings.attendance.default_break_minutes,
        )
        .await?;
        let tags = TagRegistry::load(local).await?;
        let entries = load_entries(&replicator).await?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        info!(
            employees = directory.list_employees().len(),
            entries = entries.len(),
            tags = tags.bindings().len(),
            "attendance engine ready"
        );

        Ok(Self {
            reconciler: Reconciler::new(replicator.clone()),
            replicator,
            directory,
            tags,
            entries: RwLock::new(entries),
            locks: EmployeeLocks::new(),
            events,
            registration_timeout: settings.attendance.registration_timeout(),
        })
    }

    /// Receives every attendance event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AttendanceEvent> {
        self.events.subscribe()
    }

    /// The remote store, for connectivity probing.
    pub fn remote_store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(self.replicator.remote())
    }

    /// The employee directory.
    pub fn directory(&self) -> &EmployeeDirectory {
        &self.directory
    }

    // ---- attendance ----

    /// Opens a shift for the employee.
    ///
    /// # Errors
    ///
    /// * [`EngineError::EmployeeNotFound`] when the employee does not exist
    /// * [`EngineError::InvalidTransition`] when a shift is already open
    pub async fn clock_in(&self, employee_id: &str, now: NaiveDateTime) -> EngineResult<TimeEntry> {
        let _gate = self.replicator.hold().await;
        let _lock = self.locks.acquire(employee_id).await;
        let employee = self.directory.get_employee(employee_id)?;
        self.open_shift_locked(&employee, now).await
    }

    /// Closes the open shift. A break in progress ends at the same instant.
    pub async fn clock_out(&self, employee_id: &str, now: NaiveDateTime) -> EngineResult<TimeEntry> {
        let _gate = self.replicator.hold().await;
        let _lock = self.locks.acquire(employee_id).await;
        let employee = self.directory.get_employee(employee_id)?;
        let open = self
            .find_open(employee_id)
            .ok_or_else(|| transition(employee_id, AttendanceState::Absent, Operation::ClockOut))?;
        self.close_shift_locked(&employee, open, now).await
    }

    /// Starts a manual break in the open shift.
    pub async fn start_break(&self, employee_id: &str, now: NaiveDateTime) -> EngineResult<TimeEntry> {
        let _gate = self.replicator.hold().await;
        let _lock = self.locks.acquire(employee_id).await;
        self.directory.get_employee(employee_id)?;

        let mut entry = self.expect_state(employee_id, AttendanceState::Active, Operation::StartBreak)?;
        entry.begin_break(now);
        entry.validate()?;
        let outcome = self.replicator.update(&entry).await?;
        self.cache_entry(entry.clone());

        info!(employee_id, entry_id = %entry.id, queued = outcome.is_pending(), "break started");
        self.publish(AttendanceEvent::BreakStarted {
            employee_id: employee_id.to_string(),
            timestamp: now,
        });
        Ok(entry)
    }

    /// Ends the break in progress.
    pub async fn end_break(&self, employee_id: &str, now: NaiveDateTime) -> EngineResult<TimeEntry> {
        let _gate = self.replicator.hold().await;
        let _lock = self.locks.acquire(employee_id).await;
        self.directory.get_employee(employee_id)?;

        let mut entry = self.expect_state(employee_id, AttendanceState::OnBreak, Operation::EndBreak)?;
        entry.finish_break(now);
        entry.validate()?;
        let outcome = self.replicator.update(&entry).await?;
        self.cache_entry(entry.clone());

        info!(employee_id, entry_id = %entry.id, queued = outcome.is_pending(), "break ended");
        self.publish(AttendanceEvent::BreakEnded {
            employee_id: employee_id.to_string(),
            timestamp: now,
        });
        Ok(entry)
    }

    /// Toggles attendance for the employee a badge is bound to.
    ///
    /// An open shift is clocked out, otherwise a new shift is clocked in.
    /// An unbound badge changes nothing and publishes
    /// [`AttendanceEvent::UnknownTag`].
    pub async fn process_scan(&self, tag_uid: &str, now: NaiveDateTime) -> EngineResult<ScanOutcome> {
        let tag_uid = normalize_tag_uid(tag_uid);
        let _gate = self.replicator.hold().await;

        let Some(employee_id) = self.tags.resolve(&tag_uid) else {
            warn!(tag_uid = %tag_uid, "badge not recognized");
            self.publish(AttendanceEvent::UnknownTag {
                tag_uid: tag_uid.clone(),
                timestamp: now,
            });
            return Err(EngineError::UnknownTag { tag_uid });
        };

        let _lock = self.locks.acquire(&employee_id).await;
        let employee = self.directory.get_employee(&employee_id)?;
        let (action, entry) = match self.find_open(&employee_id) {
            Some(open) => (
                ClockAction::ClockOut,
                self.close_shift_locked(&employee, open, now).await?,
            ),
            None => (
                ClockAction::ClockIn,
                self.open_shift_locked(&employee, now).await?,
            ),
        };

        debug!(tag_uid = %tag_uid, employee_id = %employee_id, action = action.as_str(), "scan processed");
        Ok(ScanOutcome {
            employee_id,
            action,
            employee,
            entry,
        })
    }

    /// Routes a reader scan: it completes a pending tag registration if
    /// there is one, otherwise it toggles attendance.
    pub async fn handle_scan(&self, scan: ScanEvent) -> EngineResult<ScanDisposition> {
        if let Some(claimed) = self.tags.claim_pending() {
            let result = self
                .bind_tag(&claimed.employee_id, &scan.tag_uid, scan.scanned_at)
                .await;
            if claimed.reply.send(result.clone()).is_err() {
                debug!(employee_id = %claimed.employee_id, "registration waiter left before the scan");
            }
            return result.map(ScanDisposition::Registration);
        }

        self.process_scan(&scan.tag_uid, scan.scanned_at)
            .await
            .map(ScanDisposition::Attendance)
    }

    /// Consumes scans pushed by the reader until the sender is dropped.
    pub async fn run_scan_loop(&self, mut scans: mpsc::Receiver<ScanEvent>) {
        while let Some(scan) = scans.recv().await {
            match self.handle_scan(scan).await {
                Ok(ScanDisposition::Attendance(outcome)) => info!(
                    employee_id = %outcome.employee_id,
                    action = outcome.action.as_str(),
                    "badge scan"
                ),
                Ok(ScanDisposition::Registration(binding)) => info!(
                    tag_uid = %binding.tag_uid,
                    employee_id = %binding.employee_id,
                    "badge registered"
                ),
                Err(error) => warn!(error = %error, "badge scan rejected"),
            }
        }
        debug!("scan source closed");
    }

    async fn open_shift_locked(&self, employee: &Employee, now: NaiveDateTime) -> EngineResult<TimeEntry> {
        if let Some(open) = self.find_open(&employee.id) {
            return Err(transition(&employee.id, open.state(), Operation::ClockIn));
        }

        let mut entry = TimeEntry::open(employee.id.clone(), now);
        let outcome = self.replicator.create(&mut entry).await?;
        self.cache_entry(entry.clone());

        info!(
            employee_id = %employee.id,
            entry_id = %entry.id,
            queued = outcome.is_pending(),
            "clocked in"
        );
        self.notify_clock(employee, ClockAction::ClockIn, &entry, now);
        Ok(entry)
    }

    async fn close_shift_locked(
        &self,
        employee: &Employee,
        mut entry: TimeEntry,
        now: NaiveDateTime,
    ) -> EngineResult<TimeEntry> {
        entry.close(now);
        entry.validate()?;
        let outcome = self.replicator.update(&entry).await?;
        self.cache_entry(entry.clone());

        info!(
            employee_id = %employee.id,
            entry_id = %entry.id,
            queued = outcome.is_pending(),
            "clocked out"
        );
        self.notify_clock(employee, ClockAction::ClockOut, &entry, now);
        Ok(entry)
    }

    fn notify_clock(&self, employee: &Employee, action: ClockAction, entry: &TimeEntry, now: NaiveDateTime) {
        self.publish(AttendanceEvent::Clock(ClockNotice {
            employee: employee.clone(),
            action,
            timestamp: now,
            entry_id: entry.id.clone(),
            greeting: employee.greeting(action),
        }));
    }

    fn expect_state(
        &self,
        employee_id: &str,
        expected: AttendanceState,
        operation: Operation,
    ) -> EngineResult<TimeEntry> {
        match self.find_open(employee_id) {
            Some(entry) if entry.state() == expected => Ok(entry),
            Some(entry) => Err(transition(employee_id, entry.state(), operation)),
            None => Err(transition(employee_id, AttendanceState::Absent, operation)),
        }
    }

    // ---- queries ----

    /// Current attendance state of an employee.
    pub fn current_state(&self, employee_id: &str) -> EngineResult<AttendanceState> {
        self.directory.get_employee(employee_id)?;
        Ok(self
            .find_open(employee_id)
            .map_or(AttendanceState::Absent, |entry| entry.state()))
    }

    /// The employee's open shift, if any.
    pub fn open_entry(&self, employee_id: &str) -> Option<TimeEntry> {
        self.find_open(employee_id)
    }

    /// Looks up a time entry.
    pub fn get_entry(&self, entry_id: &str) -> EngineResult<TimeEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entry_id)
            .cloned()
            .ok_or_else(|| EngineError::EntryNotFound {
                entry_id: entry_id.to_string(),
            })
    }

    /// Every time entry, most recent first.
    pub fn list_entries(&self) -> Vec<TimeEntry> {
        let mut entries: Vec<TimeEntry> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.start_time.cmp(&a.start_time).then_with(|| a.id.cmp(&b.id)));
        entries
    }

    /// Entries of one employee (or all) whose start falls in `period`, most recent first.
    pub fn filter_entries(
        &self,
        employee_id: Option<&str>,
        period: ReportPeriod,
        now: NaiveDateTime,
    ) -> Vec<TimeEntry> {
        calculation::filter_entries(&self.list_entries(), employee_id, period, now)
    }

    /// Statistics for the week containing `now`.
    pub fn weekly_stats(&self, now: NaiveDateTime) -> WeeklyStats {
        calculation::weekly_stats(&self.list_entries(), &self.directory.list_employees(), now)
    }

    /// Statistics of one employee over a period.
    pub fn employee_stats(
        &self,
        employee_id: &str,
        period: ReportPeriod,
        now: NaiveDateTime,
    ) -> EngineResult<EmployeeStats> {
        let employee = self.directory.get_employee(employee_id)?;
        Ok(calculation::employee_stats(&employee, &self.list_entries(), period, now))
    }

    /// Attendance register rows for the selected entries.
    pub fn register(
        &self,
        employee_id: Option<&str>,
        period: ReportPeriod,
        now: NaiveDateTime,
    ) -> Vec<RegisterRow> {
        let entries = self.filter_entries(employee_id, period, now);
        calculation::register_rows(&entries, &self.directory.list_employees())
    }

    fn find_open(&self, employee_id: &str) -> Option<TimeEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|entry| entry.employee_id == employee_id && entry.is_open())
            .max_by_key(|entry| entry.start_time)
            .cloned()
    }

    fn cache_entry(&self, entry: TimeEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entry.id.clone(), entry);
    }

    fn evict_entry(&self, entry_id: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(entry_id);
    }

    fn publish(&self, event: AttendanceEvent) {
        // No subscriber is not an error
        let _ = self.events.send(event);
    }

    // ---- administration ----

    /// Creates an employee.
    pub async fn create_employee(&self, new: NewEmployee) -> EngineResult<Employee> {
        let _gate = self.replicator.hold().await;
        let (employee, _) = self.directory.create_employee(new).await?;
        Ok(employee)
    }

    /// Applies a partial update to an employee.
    pub async fn update_employee(&self, employee_id: &str, update: &EmployeeUpdate) -> EngineResult<Employee> {
        let _gate = self.replicator.hold().await;
        let (employee, _) = self.directory.update_employee(employee_id, update).await?;
        Ok(employee)
    }

    /// Deletes an employee together with every time entry and tag binding they own.
    ///
    /// Synced records can only be deleted while the remote store is
    /// reachable; [`EngineError::Disconnected`] is returned otherwise.
    pub async fn delete_employee(&self, employee_id: &str) -> EngineResult<()> {
        let _gate = self.replicator.hold().await;
        self.directory.get_employee(employee_id)?;
        let lock = self.locks.acquire(employee_id).await;

        let owned: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|entry| entry.employee_id == employee_id)
            .map(|entry| entry.id.clone())
            .collect();
        for entry_id in &owned {
            self.replicator.delete::<TimeEntry>(entry_id).await?;
            self.evict_entry(entry_id);
        }
        let tags = self.tags.unbind_employee(employee_id).await?;
        self.directory.remove(employee_id).await?;

        info!(employee_id, entries = owned.len(), tags, "employee deleted");
        drop(lock);
        self.locks.forget(employee_id);
        Ok(())
    }

    /// Corrects a time entry.
    ///
    /// The edit runs under the owning employee's lock. The status is derived
    /// again from the new times, a break still open when an end time is set
    /// ends with the shift, and edits that would leave the employee with two
    /// open shifts or break the ordering of times are rejected with
    /// [`EngineError::InvalidEntry`].
    pub async fn edit_entry(&self, entry_id: &str, edit: EntryEdit) -> EngineResult<TimeEntry> {
        let _gate = self.replicator.hold().await;
        let employee_id = self.get_entry(entry_id)?.employee_id;
        let _lock = self.locks.acquire(&employee_id).await;
        let mut entry = self.get_entry(entry_id)?;

        if let Some(start) = edit.start_time {
            entry.start_time = start;
        }
        match edit.end_time {
            Some(Some(end)) => entry.close(end),
            Some(None) => {
                entry.end_time = None;
                entry.status = entry.derived_status();
            }
            None => {}
        }
        if let Some(notes) = edit.notes {
            entry.notes = notes;
        }

        if entry.is_open() {
            if let Some(other) = self.find_open(&employee_id).filter(|other| other.id != entry.id) {
                return Err(EngineError::InvalidEntry {
                    entry_id: entry.id.clone(),
                    message: format!("employee already has an open shift '{}'", other.id),
                });
            }
        }
        entry.validate()?;

        let outcome = self.replicator.update(&entry).await?;
        self.cache_entry(entry.clone());
        info!(
            employee_id = %employee_id,
            entry_id,
            queued = outcome.is_pending(),
            "time entry edited"
        );
        Ok(entry)
    }

    /// Deletes a time entry.
    pub async fn delete_entry(&self, entry_id: &str) -> EngineResult<()> {
        let _gate = self.replicator.hold().await;
        let employee_id = self.get_entry(entry_id)?.employee_id;
        let _lock = self.locks.acquire(&employee_id).await;

        self.replicator.delete::<TimeEntry>(entry_id).await?;
        self.evict_entry(entry_id);
        info!(employee_id = %employee_id, entry_id, "time entry deleted");
        Ok(())
    }

    // ---- tags ----

    /// Waits for the next scan and binds its tag to the employee.
    ///
    /// Only one registration is pending at a time; starting another one
    /// cancels the first with [`EngineError::RegistrationCancelled`]. When no
    /// scan arrives in time the listener is removed and
    /// [`EngineError::Timeout`] is returned, so a later scan is processed as
    /// an ordinary attendance tap.
    pub async fn register_tag(&self, employee_id: &str) -> EngineResult<TagBinding> {
        self.directory.get_employee(employee_id)?;
        let (_listener, reply) = self.tags.begin_registration(employee_id);
        info!(
            employee_id,
            timeout_ms = u64::try_from(self.registration_timeout.as_millis()).unwrap_or(u64::MAX),
            "waiting for badge to register"
        );

        match tokio::time::timeout(self.registration_timeout, reply).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(EngineError::RegistrationCancelled {
                employee_id: employee_id.to_string(),
            }),
            Err(_) => {
                warn!(employee_id, "no badge scanned before the registration timeout");
                Err(EngineError::Timeout {
                    operation: "tag scan".to_string(),
                    seconds: self.registration_timeout.as_secs(),
                })
            }
        }
    }

    /// Binds a tag to an employee directly, replacing their previous tag.
    pub async fn bind_tag(
        &self,
        employee_id: &str,
        tag_uid: &str,
        at: NaiveDateTime,
    ) -> EngineResult<TagBinding> {
        let _gate = self.replicator.hold().await;
        self.directory.get_employee(employee_id)?;
        let binding = self
            .tags
            .bind(TagBinding {
                tag_uid: tag_uid.to_string(),
                employee_id: employee_id.to_string(),
                registered_at: at,
            })
            .await?;

        info!(tag_uid = %binding.tag_uid, employee_id, "tag bound");
        self.publish(AttendanceEvent::TagRegistered(binding.clone()));
        Ok(binding)
    }

    /// Removes a tag binding.
    pub async fn unbind_tag(&self, tag_uid: &str) -> EngineResult<TagBinding> {
        let _gate = self.replicator.hold().await;
        match self.tags.unbind(tag_uid).await? {
            Some(binding) => {
                info!(tag_uid = %binding.tag_uid, employee_id = %binding.employee_id, "tag unbound");
                Ok(binding)
            }
            None => Err(EngineError::UnknownTag {
                tag_uid: normalize_tag_uid(tag_uid),
            }),
        }
    }

    /// The employee a tag is bound to.
    pub fn resolve_tag(&self, tag_uid: &str) -> EngineResult<String> {
        let tag_uid = normalize_tag_uid(tag_uid);
        self.tags
            .resolve(&tag_uid)
            .ok_or(EngineError::UnknownTag { tag_uid })
    }

    /// Every tag binding, ordered by tag.
    pub fn export_tag_bindings(&self) -> Vec<TagBinding> {
        self.tags.bindings()
    }

    /// Restores exported bindings, returning how many were applied.
    ///
    /// Bindings of employees that no longer exist are skipped.
    pub async fn import_tag_bindings(&self, bindings: Vec<TagBinding>) -> EngineResult<usize> {
        let _gate = self.replicator.hold().await;
        let mut imported = 0;
        for binding in bindings {
            if !self.directory.contains(&binding.employee_id) {
                warn!(
                    tag_uid = %binding.tag_uid,
                    employee_id = %binding.employee_id,
                    "skipping binding of unknown employee"
                );
                continue;
            }
            self.tags.bind(binding).await?;
            imported += 1;
        }
        info!(imported, "tag bindings imported");
        Ok(imported)
    }

    // ---- sync ----

    /// Status for the "pending sync" indicator.
    pub async fn sync_status(&self) -> EngineResult<SyncStatus> {
        self.reconciler.status().await
    }

    /// Returns true when the remote store answers.
    pub async fn is_connected(&self) -> bool {
        self.replicator.remote().is_connected().await
    }

    /// Replays offline work against the remote store.
    ///
    /// Waits for in-flight mutations and blocks new ones until done, so
    /// concurrent calls run one after the other and the second one finds
    /// nothing left to send.
    pub async fn reconcile(&self) -> EngineResult<SyncReport> {
        let permit = self.replicator.exclusive().await;
        let report = self.reconciler.reconcile(&permit).await?;
        if report.is_empty() {
            return Ok(report);
        }

        let ids = &report.remapped_ids;
        self.tags.remap(ids).await?;
        self.directory.remap(ids);
        self.remap_entries(ids);
        for offline in ids.keys() {
            self.locks.forget(offline);
        }

        if let Err(error) = self.reload().await {
            warn!(error = %error, "reconciled but could not reload records");
        }
        Ok(report)
    }

    /// Reloads employees and time entries from storage.
    pub async fn refresh(&self) -> EngineResult<()> {
        let _gate = self.replicator.hold().await;
        self.reload().await
    }

    async fn reload(&self) -> EngineResult<()> {
        self.directory.refresh().await?;
        let entries = load_entries(&self.replicator).await?;
        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = entries;
        Ok(())
    }

    fn remap_entries(&self, ids: &IdMap) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let remapped: BTreeMap<String, TimeEntry> = std::mem::take(&mut *entries)
            .into_values()
            .map(|mut entry| {
                if let Some(remote) = ids.get(&entry.id) {
                    entry.id = remote.clone();
                }
                entry.rewrite_references(ids);
                (entry.id.clone(), entry)
            })
            .collect();
        *entries = remapped;
    }
}

#[async_trait]
impl Reconcile for AttendanceEngine {
    async fn reconcile(&self) -> EngineResult<SyncReport> {
        AttendanceEngine::reconcile(self).await
    }
}

async fn load_entries(replicator: &Replicator) -> EngineResult<BTreeMap<String, TimeEntry>> {
    Ok(replicator
        .load_all::<TimeEntry>()
        .await?
        .into_iter()
        .map(|entry| (entry.id.clone(), entry))
        .collect())
}

fn transition(employee_id: &str, state: AttendanceState, operation: Operation) -> EngineError {
    EngineError::InvalidTransition {
        employee_id: employee_id.to_string(),
        state,
        operation,
    }
}
