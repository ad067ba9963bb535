//! Employee directory.
//!
//! Keeps the employee records in memory for lookups made on every clock
//! operation, and persists administrative changes through the
//! [`Replicator`] so they survive an outage of the remote store.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use rust_decimal::Decimal;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::models::{Employee, EmployeeUpdate, NewEmployee};
use crate::sync::{IdMap, Replicator, WriteOutcome};

/// In-memory index of employees backed by replicated storage.
pub struct EmployeeDirectory {
    replicator: Arc<Replicator>,
    default_break: u32,
    employees: RwLock<BTreeMap<String, Employee>>,
}

impl EmployeeDirectory {
    /// Loads every known employee.
    ///
    /// # Arguments
    ///
    /// * `replicator` - Storage the records are read from and written to
    /// * `default_break` - Break cap given to new employees that omit one
    pub async fn load(replicator: Arc<Replicator>, default_break: u32) -> EngineResult<Self> {
        let directory = Self {
            replicator,
            default_break,
            employees: RwLock::new(BTreeMap::new()),
        };
        directory.refresh().await?;
        Ok(directory)
    }

    /// Reloads the index from storage.
    pub async fn refresh(&self) -> EngineResult<()> {
        let loaded = self.replicator.load_all::<Employee>().await?;
        let mut employees = self.employees.write().unwrap_or_else(PoisonError::into_inner);
        *employees = loaded.into_iter().map(|e| (e.id.clone(), e)).collect();
        Ok(())
    }

    /// Looks up an employee.
    pub fn get_employee(&self, employee_id: &str) -> EngineResult<Employee> {
        self.employees
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(employee_id)
            .cloned()
            .ok_or_else(|| EngineError::EmployeeNotFound {
                employee_id: employee_id.to_string(),
            })
    }

    /// Returns true when the employee exists.
    pub fn contains(&self, employee_id: &str) -> bool {
        self.employees
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(employee_id)
    }

    /// All employees ordered by name.
    pub fn list_employees(&self) -> Vec<Employee> {
        let mut employees: Vec<Employee> = self
            .employees
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        employees.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        employees
    }

    pub(crate) async fn create_employee(
        &self,
        new: NewEmployee,
    ) -> EngineResult<(Employee, WriteOutcome)> {
        let mut employee = new.into_employee(self.default_break);
        employee.name = employee.name.trim().to_string();
        validate(&employee)?;

        let outcome = self.replicator.create(&mut employee).await?;
        info!(
            employee_id = %employee.id,
            queued = outcome.is_pending(),
            "employee created"
        );
        self.insert(employee.clone());
        Ok((employee, outcome))
    }

    pub(crate) async fn update_employee(
        &self,
        employee_id: &str,
        update: &EmployeeUpdate,
    ) -> EngineResult<(Employee, WriteOutcome)> {
        let mut employee = self.get_employee(employee_id)?;
        update.apply(&mut employee);
        employee.name = employee.name.trim().to_string();
        validate(&employee)?;

        let outcome = self.replicator.update(&employee).await?;
        info!(employee_id, queued = outcome.is_pending(), "employee updated");
        self.insert(employee.clone());
        Ok((employee, outcome))
    }

    pub(crate) async fn remove(&self, employee_id: &str) -> EngineResult<()> {
        self.replicator.delete::<Employee>(employee_id).await?;
        self.employees
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(employee_id);
        Ok(())
    }

    /// Renames offline ids after reconciliation.
    pub(crate) fn remap(&self, ids: &IdMap) {
        let mut employees = self.employees.write().unwrap_or_else(PoisonError::into_inner);
        for (offline, remote) in ids {
            if let Some(mut employee) = employees.remove(offline) {
                employee.id = remote.clone();
                employees.insert(remote.clone(), employee);
            }
        }
    }

    fn insert(&self, employee: Employee) {
        self.employees
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(employee.id.clone(), employee);
    }
}

fn validate(employee: &Employee) -> EngineResult<()> {
    if employee.name.is_empty() {
        return Err(EngineError::InvalidEmployee {
            field: "name".to_string(),
            message: "name must not be empty".to_string(),
        });
    }
    if let Some(rate) = employee.hourly_rate {
        if rate < Decimal::ZERO {
            return Err(EngineError::InvalidEmployee {
                field: "hourly_rate".to_string(),
                message: format!("hourly rate must not be negative, got {}", rate),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DocumentStore, EMPLOYEES, MemoryStore};

    fn setup() -> (Arc<MemoryStore>, Arc<Replicator>) {
        let remote = Arc::new(MemoryStore::new());
        let local = Arc::new(MemoryStore::new());
        (remote.clone(), Arc::new(Replicator::new(remote, local)))
    }

    fn new_employee(name: &str) -> NewEmployee {
        NewEmployee {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_applies_default_break_and_persists() {
        let (remote, replicator) = setup();
        let directory = EmployeeDirectory::load(replicator, 45).await.unwrap();

        let (employee, outcome) = directory
            .create_employee(new_employee("  Awa  "))
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Remote);
        assert_eq!(employee.name, "Awa");
        assert_eq!(employee.break_duration, 45);
        assert!(remote.get(EMPLOYEES, &employee.id).await.unwrap().is_some());
        assert_eq!(directory.get_employee(&employee.id).unwrap(), employee);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name_and_negative_rate() {
        let (_remote, replicator) = setup();
        let directory = EmployeeDirectory::load(replicator, 30).await.unwrap();

        let result = directory.create_employee(new_employee("   ")).await;
        assert!(matches!(
            result,
            Err(EngineError::InvalidEmployee { ref field, .. }) if field == "name"
        ));

        let mut new = new_employee("Moussa");
        new.hourly_rate = Some(Decimal::new(-1, 0));
        let result = directory.create_employee(new).await;
        assert!(matches!(
            result,
            Err(EngineError::InvalidEmployee { ref field, .. }) if field == "hourly_rate"
        ));
        assert!(directory.list_employees().is_empty());
    }

    #[tokio::test]
    async fn test_list_is_sorted_by_name() {
        let (_remote, replicator) = setup();
        let directory = EmployeeDirectory::load(replicator, 30).await.unwrap();
        for name in ["Moussa", "Awa", "Fatou"] {
            directory.create_employee(new_employee(name)).await.unwrap();
        }

        let names: Vec<String> = directory.list_employees().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Awa", "Fatou", "Moussa"]);
    }

    #[tokio::test]
    async fn test_update_and_missing_employee() {
        let (_remote, replicator) = setup();
        let directory = EmployeeDirectory::load(replicator, 30).await.unwrap();
        let (employee, _) = directory.create_employee(new_employee("Awa")).await.unwrap();

        let update = EmployeeUpdate {
            position: Some("Cashier".to_string()),
            ..Default::default()
        };
        let (updated, _) = directory.update_employee(&employee.id, &update).await.unwrap();
        assert_eq!(updated.position, "Cashier");

        let missing = directory.update_employee("emp_404", &update).await;
        assert!(matches!(missing, Err(EngineError::EmployeeNotFound { .. })));
    }

    #[tokio::test]
    async fn test_offline_employee_survives_reload() {
        let (remote, replicator) = setup();
        let directory = EmployeeDirectory::load(replicator.clone(), 30).await.unwrap();

        remote.set_connected(false);
        let (employee, outcome) = directory.create_employee(new_employee("Awa")).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Local);
        assert!(employee.is_offline());

        let reloaded = EmployeeDirectory::load(replicator, 30).await.unwrap();
        assert_eq!(reloaded.get_employee(&employee.id).unwrap().name, "Awa");
    }

    #[tokio::test]
    async fn test_remap_renames_offline_ids() {
        let (remote, replicator) = setup();
        let directory = EmployeeDirectory::load(replicator, 30).await.unwrap();
        remote.set_connected(false);
        let (employee, _) = directory.create_employee(new_employee("Awa")).await.unwrap();

        let ids = IdMap::from([(employee.id.clone(), "abcd".to_string())]);
        directory.remap(&ids);
        assert!(!directory.contains(&employee.id));
        assert_eq!(directory.get_employee("abcd").unwrap().id, "abcd");
    }
}
