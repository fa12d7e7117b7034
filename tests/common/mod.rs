#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use hr_ledger::ledger::LedgerEngine;
use hr_ledger::model::{
    department::Department,
    employee::Employee,
    leave_type::{FixedRange, LeaveTypeConfig},
    request::{OvertimeUsage, Request, RequestDraft, RequestKind, RequestStatus},
    role::Role,
};
use hr_ledger::store::MemoryStore;

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";
pub const CARL: &str = "carl";
pub const SUPERVISOR: &str = "sam";
pub const ADMIN: &str = "ada";

pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn employee(id: &str, name: &str, role: Role, department: Option<&str>) -> Employee {
    Employee {
        id: id.into(),
        full_name: name.into(),
        role,
        department_id: department.map(Into::into),
        days_available: dec!(20),
        overtime_hours: Decimal::ZERO,
    }
}

fn leave_type(id: &str, label: &str, subtracts_days: bool) -> LeaveTypeConfig {
    LeaveTypeConfig {
        id: id.into(),
        label: label.into(),
        subtracts_days,
        fixed_range: None,
    }
}

/// Operations has Alice and Bob, Finance has Carl. Everyone starts with 20
/// days and no overtime.
pub fn seeded_store() -> MemoryStore {
    MemoryStore::new()
        .with_department(Department {
            id: "ops".into(),
            name: "Operations".into(),
        })
        .with_department(Department {
            id: "fin".into(),
            name: "Finance".into(),
        })
        .with_employee(employee(ALICE, "Alice Smith", Role::Worker, Some("ops")))
        .with_employee(employee(BOB, "Bob Jones", Role::Worker, Some("ops")))
        .with_employee(employee(CARL, "Carl Berg", Role::Worker, Some("fin")))
        .with_employee(employee(SUPERVISOR, "Sam Lead", Role::Supervisor, Some("ops")))
        .with_employee(employee(ADMIN, "Ada Admin", Role::Admin, None))
        .with_leave_type(leave_type("VACATION", "Vacation", true))
        .with_leave_type(leave_type("SICK", "Sick leave", false))
        .with_leave_type(LeaveTypeConfig {
            fixed_range: Some(FixedRange {
                start: day("2024-12-24"),
                end: day("2024-12-26"),
            }),
            ..leave_type("XMAS", "Christmas closure", true)
        })
}

pub async fn engine_over(store: &Arc<MemoryStore>) -> LedgerEngine {
    LedgerEngine::new(store.clone()).await.unwrap()
}

pub fn draft(type_id: &str, start: &str, end: Option<&str>) -> RequestDraft {
    RequestDraft {
        type_id: type_id.into(),
        start_date: day(start),
        end_date: end.map(day),
        hours: None,
        reason: None,
        overtime_usage: None,
    }
}

pub fn hours_draft(type_id: &str, hours: Decimal) -> RequestDraft {
    RequestDraft {
        hours: Some(hours),
        ..draft(type_id, "2024-06-03", None)
    }
}

pub fn usage_draft(type_id: &str, usage: &[(&str, Decimal)]) -> RequestDraft {
    RequestDraft {
        overtime_usage: Some(
            usage
                .iter()
                .map(|(source, hours)| OvertimeUsage {
                    source_id: source.to_string(),
                    hours_used: *hours,
                })
                .collect(),
        ),
        ..draft(type_id, "2024-06-20", None)
    }
}

/// An approved earn record seeded directly into the store.
pub fn earn_record(id: &str, employee_id: &str, hours: Decimal, consumed: Decimal) -> Request {
    Request {
        id: id.into(),
        employee_id: employee_id.into(),
        kind: RequestKind::OvertimeEarn,
        label: "Overtime".into(),
        subtracts_days: false,
        start_date: day("2024-06-01"),
        end_date: None,
        hours: Some(hours),
        reason: None,
        status: RequestStatus::Approved,
        created_at: Utc::now(),
        admin_comment: None,
        reviewed_by: Some(SUPERVISOR.into()),
        created_by_admin: false,
        consumed_hours: consumed,
        overtime_usage: None,
    }
}
