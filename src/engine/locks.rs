//! Per-employee mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializes attendance mutations of one employee.
///
/// Operations on different employees never contend.
#[derive(Default)]
pub(crate) struct EmployeeLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl EmployeeLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `employee_id`.
    pub(crate) async fn acquire(&self, employee_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(employee_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Drops the lock of an employee that no longer exists under this id.
    pub(crate) fn forget(&self, employee_id: &str) {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(employee_id);
    }
}
