//! Durable-store interface consumed by the ledger engine.
//!
//! The engine only ever reads through the query methods and writes through
//! [`Store::commit`], which applies a whole [`ChangeSet`] or nothing.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::ledger::impact::Impact;
use crate::model::{
    balance_entry::BalanceEntry,
    department::Department,
    employee::{Employee, NewEmployee},
    leave_type::LeaveTypeConfig,
    request::{Request, RequestFilter},
};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[async_trait]
pub trait Store: Send + Sync {
    async fn get_employee(&self, id: &str) -> StoreResult<Option<Employee>>;
    async fn list_employees(&self) -> StoreResult<Vec<Employee>>;
    /// Inserts an employee and returns it with its assigned id.
    async fn insert_employee(&self, employee: NewEmployee) -> StoreResult<Employee>;

    async fn list_departments(&self) -> StoreResult<Vec<Department>>;

    async fn list_leave_types(&self) -> StoreResult<Vec<LeaveTypeConfig>>;
    async fn upsert_leave_type(&self, leave_type: &LeaveTypeConfig) -> StoreResult<()>;
    async fn delete_leave_type(&self, id: &str) -> StoreResult<bool>;

    async fn get_request(&self, id: &str) -> StoreResult<Option<Request>>;
    /// Newest first.
    async fn list_requests(&self, filter: &RequestFilter) -> StoreResult<Vec<Request>>;

    /// Oldest first.
    async fn list_balance_entries(&self, employee_id: &str) -> StoreResult<Vec<BalanceEntry>>;

    async fn commit(&self, change: ChangeSet) -> StoreResult<CommitReceipt>;
}

#[derive(Debug, Clone)]
pub enum RequestWrite {
    /// An empty `id` asks the store to assign one.
    Insert(Request),
    Update(Request),
    Delete(String),
}

/// New absolute balances for one employee plus the delta that produced them.
#[derive(Debug, Clone)]
pub struct BalanceWrite {
    pub employee_id: String,
    pub delta: Impact,
    pub days_available: rust_decimal::Decimal,
    pub overtime_hours: rust_decimal::Decimal,
    pub reason: String,
}

/// New `consumed_hours` for an earn record.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionWrite {
    pub source_id: String,
    pub consumed_hours: rust_decimal::Decimal,
}

#[derive(Debug, Clone)]
pub struct ChangeSet {
    pub request: RequestWrite,
    pub balance: Option<BalanceWrite>,
    pub consumption: Vec<ConsumptionWrite>,
}

#[derive(Debug, Clone)]
pub struct CommitReceipt {
    pub request_id: String,
}
