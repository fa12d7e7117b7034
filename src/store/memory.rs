use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{ChangeSet, CommitReceipt, RequestWrite, Store};
use crate::error::{StoreError, StoreResult};
use crate::model::{
    balance_entry::BalanceEntry,
    department::Department,
    employee::{Employee, NewEmployee},
    leave_type::LeaveTypeConfig,
    request::{Request, RequestFilter},
};

#[derive(Default)]
struct Tables {
    employees: BTreeMap<String, Employee>,
    departments: BTreeMap<String, Department>,
    leave_types: BTreeMap<String, LeaveTypeConfig>,
    requests: BTreeMap<String, Request>,
    balance_entries: Vec<BalanceEntry>,
}

/// Process-local store used by tests and by the server when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_next_commit: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_department(self, department: Department) -> Self {
        if let Ok(mut t) = self.tables.write() {
            t.departments.insert(department.id.clone(), department);
        }
        self
    }

    pub fn with_employee(self, employee: Employee) -> Self {
        if let Ok(mut t) = self.tables.write() {
            t.employees.insert(employee.id.clone(), employee);
        }
        self
    }

    pub fn with_leave_type(self, leave_type: LeaveTypeConfig) -> Self {
        if let Ok(mut t) = self.tables.write() {
            t.leave_types.insert(leave_type.id.clone(), leave_type);
        }
        self
    }

    /// Seeds a request row as-is, bypassing the ledger.
    pub fn with_request(self, request: Request) -> Self {
        if let Ok(mut t) = self.tables.write() {
            t.requests.insert(request.id.clone(), request);
        }
        self
    }

    /// Makes the next `commit` fail as a transport error would.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_employee(&self, id: &str) -> StoreResult<Option<Employee>> {
        Ok(self.read()?.employees.get(id).cloned())
    }

    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        Ok(self.read()?.employees.values().cloned().collect())
    }

    async fn insert_employee(&self, employee: NewEmployee) -> StoreResult<Employee> {
        let employee = Employee {
            id: Uuid::new_v4().to_string(),
            full_name: employee.full_name,
            role: employee.role,
            department_id: employee.department_id,
            days_available: employee.days_available,
            overtime_hours: employee.overtime_hours,
        };
        self.write()?
            .employees
            .insert(employee.id.clone(), employee.clone());
        Ok(employee)
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        Ok(self.read()?.departments.values().cloned().collect())
    }

    async fn list_leave_types(&self) -> StoreResult<Vec<LeaveTypeConfig>> {
        Ok(self.read()?.leave_types.values().cloned().collect())
    }

    async fn upsert_leave_type(&self, leave_type: &LeaveTypeConfig) -> StoreResult<()> {
        self.write()?
            .leave_types
            .insert(leave_type.id.clone(), leave_type.clone());
        Ok(())
    }

    async fn delete_leave_type(&self, id: &str) -> StoreResult<bool> {
        Ok(self.write()?.leave_types.remove(id).is_some())
    }

    async fn get_request(&self, id: &str) -> StoreResult<Option<Request>> {
        Ok(self.read()?.requests.get(id).cloned())
    }

    async fn list_requests(&self, filter: &RequestFilter) -> StoreResult<Vec<Request>> {
        let mut rows: Vec<Request> = self
            .read()?
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_balance_entries(&self, employee_id: &str) -> StoreResult<Vec<BalanceEntry>> {
        Ok(self
            .read()?
            .balance_entries
            .iter()
            .filter(|e| e.employee_id == employee_id)
            .cloned()
            .collect())
    }

    async fn commit(&self, change: ChangeSet) -> StoreResult<CommitReceipt> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected commit failure".into()));
        }

        let mut t = self.write()?;

        // check every referenced row before touching anything
        if let Some(balance) = &change.balance {
            if !t.employees.contains_key(&balance.employee_id) {
                return Err(StoreError::Corrupt {
                    table: "employees",
                    detail: format!("no row {}", balance.employee_id),
                });
            }
        }
        for c in &change.consumption {
            if !t.requests.contains_key(&c.source_id) {
                return Err(StoreError::Corrupt {
                    table: "requests",
                    detail: format!("no source row {}", c.source_id),
                });
            }
        }

        let request_id = match change.request {
            RequestWrite::Insert(mut request) => {
                if request.id.is_empty() {
                    request.id = Uuid::new_v4().to_string();
                }
                let id = request.id.clone();
                t.requests.insert(id.clone(), request);
                id
            }
            RequestWrite::Update(request) => {
                let id = request.id.clone();
                match t.requests.get_mut(&id) {
                    Some(row) => *row = request,
                    None => {
                        return Err(StoreError::Corrupt {
                            table: "requests",
                            detail: format!("no row {id}"),
                        });
                    }
                }
                id
            }
            RequestWrite::Delete(id) => {
                t.requests.remove(&id);
                id
            }
        };

        for c in change.consumption {
            if let Some(source) = t.requests.get_mut(&c.source_id) {
                source.consumed_hours = c.consumed_hours;
            }
        }

        if let Some(balance) = change.balance {
            if let Some(employee) = t.employees.get_mut(&balance.employee_id) {
                employee.days_available = balance.days_available;
                employee.overtime_hours = balance.overtime_hours;
            }
            t.balance_entries.push(BalanceEntry {
                id: Uuid::new_v4().to_string(),
                employee_id: balance.employee_id,
                request_id: request_id.clone(),
                delta_days: balance.delta.delta_days,
                delta_hours: balance.delta.delta_hours,
                days_after: balance.days_available,
                hours_after: balance.overtime_hours,
                reason: balance.reason,
                created_at: Utc::now(),
            });
        }

        Ok(CommitReceipt { request_id })
    }
}
