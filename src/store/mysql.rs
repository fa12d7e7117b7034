use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySql, MySqlPool, Transaction};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::{ChangeSet, CommitReceipt, RequestWrite, Store};
use crate::error::{StoreError, StoreResult};
use crate::model::{
    balance_entry::BalanceEntry,
    department::Department,
    employee::{Employee, NewEmployee},
    leave_type::{FixedRange, LeaveTypeConfig},
    request::{OvertimeUsage, Request, RequestFilter, RequestKind, RequestStatus},
    role::Role,
};

/// MySQL-backed store. Schema lives in `sql/schema.sql`.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct EmployeeRow {
    id: String,
    full_name: String,
    role: String,
    department_id: Option<String>,
    days_available: Decimal,
    overtime_hours: Decimal,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        let role: Role = row.role.parse().map_err(|_| StoreError::Corrupt {
            table: "employees",
            detail: format!("unknown role {} on {}", row.role, row.id),
        })?;
        Ok(Employee {
            id: row.id,
            full_name: row.full_name,
            role,
            department_id: row.department_id,
            days_available: row.days_available,
            overtime_hours: row.overtime_hours,
        })
    }
}

#[derive(FromRow)]
struct LeaveTypeRow {
    id: String,
    label: String,
    subtracts_days: bool,
    fixed_start: Option<NaiveDate>,
    fixed_end: Option<NaiveDate>,
}

impl From<LeaveTypeRow> for LeaveTypeConfig {
    fn from(row: LeaveTypeRow) -> Self {
        let fixed_range = match (row.fixed_start, row.fixed_end) {
            (Some(start), Some(end)) => Some(FixedRange { start, end }),
            _ => None,
        };
        LeaveTypeConfig {
            id: row.id,
            label: row.label,
            subtracts_days: row.subtracts_days,
            fixed_range,
        }
    }
}

#[derive(FromRow)]
struct RequestRow {
    id: String,
    employee_id: String,
    type_id: String,
    label: String,
    subtracts_days: bool,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    hours: Option<Decimal>,
    reason: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    admin_comment: Option<String>,
    reviewed_by: Option<String>,
    created_by_admin: bool,
    consumed_hours: Decimal,
    overtime_usage: Option<String>,
}

impl TryFrom<RequestRow> for Request {
    type Error = StoreError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let status: RequestStatus = row.status.parse().map_err(|_| StoreError::Corrupt {
            table: "requests",
            detail: format!("unknown status {} on {}", row.status, row.id),
        })?;
        let overtime_usage = match row.overtime_usage.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(serde_json::from_str::<Vec<OvertimeUsage>>(raw).map_err(
                |e| StoreError::Corrupt {
                    table: "requests",
                    detail: format!("overtime_usage on {}: {e}", row.id),
                },
            )?),
        };
        Ok(Request {
            id: row.id,
            employee_id: row.employee_id,
            kind: RequestKind::from_type_id(&row.type_id),
            label: row.label,
            subtracts_days: row.subtracts_days,
            start_date: row.start_date,
            end_date: row.end_date,
            hours: row.hours,
            reason: row.reason,
            status,
            created_at: row.created_at,
            admin_comment: row.admin_comment,
            reviewed_by: row.reviewed_by,
            created_by_admin: row.created_by_admin,
            consumed_hours: row.consumed_hours,
            overtime_usage,
        })
    }
}

#[derive(FromRow)]
struct BalanceEntryRow {
    id: String,
    employee_id: String,
    request_id: String,
    delta_days: Decimal,
    delta_hours: Decimal,
    days_after: Decimal,
    hours_after: Decimal,
    reason: String,
    created_at: DateTime<Utc>,
}

impl From<BalanceEntryRow> for BalanceEntry {
    fn from(row: BalanceEntryRow) -> Self {
        BalanceEntry {
            id: row.id,
            employee_id: row.employee_id,
            request_id: row.request_id,
            delta_days: row.delta_days,
            delta_hours: row.delta_hours,
            days_after: row.days_after,
            hours_after: row.hours_after,
            reason: row.reason,
            created_at: row.created_at,
        }
    }
}

const REQUEST_COLUMNS: &str = r#"
    id, employee_id, type_id, label, subtracts_days, start_date, end_date, hours, reason, status,
    created_at, admin_comment, reviewed_by, created_by_admin, consumed_hours, overtime_usage
"#;

fn usage_json(request: &Request) -> StoreResult<Option<String>> {
    request
        .overtime_usage
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| StoreError::Corrupt {
            table: "requests",
            detail: format!("cannot encode overtime_usage: {e}"),
        })
}

/// Locks the row for the rest of the transaction. A missing row means the
/// engine's read is stale, so the whole change set is refused.
async fn ensure_row(
    tx: &mut Transaction<'_, MySql>,
    table: &'static str,
    id: &str,
) -> StoreResult<()> {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE id = ? FOR UPDATE");
    let found = sqlx::query_scalar::<_, i64>(&sql).bind(id).fetch_one(&mut **tx).await?;
    if found == 0 {
        error!(table, id, "Commit references a missing row");
        return Err(StoreError::Corrupt {
            table,
            detail: format!("no row {id}"),
        });
    }
    Ok(())
}

#[async_trait]
impl Store for MySqlStore {
    async fn get_employee(&self, id: &str) -> StoreResult<Option<Employee>> {
        sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, full_name, role, department_id, days_available, overtime_hours
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Employee::try_from)
        .transpose()
    }

    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, full_name, role, department_id, days_available, overtime_hours
            FROM employees
            ORDER BY full_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Employee::try_from)
        .collect()
    }

    async fn insert_employee(&self, employee: NewEmployee) -> StoreResult<Employee> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO employees
                (id, full_name, role, department_id, days_available, overtime_hours)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&employee.full_name)
        .bind(employee.role.to_string())
        .bind(&employee.department_id)
        .bind(employee.days_available)
        .bind(employee.overtime_hours)
        .execute(&self.pool)
        .await?;

        Ok(Employee {
            id,
            full_name: employee.full_name,
            role: employee.role,
            department_id: employee.department_id,
            days_available: employee.days_available,
            overtime_hours: employee.overtime_hours,
        })
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        Ok(
            sqlx::query_as::<_, Department>("SELECT id, name FROM departments ORDER BY name")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn list_leave_types(&self) -> StoreResult<Vec<LeaveTypeConfig>> {
        let rows = sqlx::query_as::<_, LeaveTypeRow>(
            r#"
            SELECT id, label, subtracts_days, fixed_start, fixed_end
            FROM leave_types
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(LeaveTypeConfig::from).collect())
    }

    async fn upsert_leave_type(&self, leave_type: &LeaveTypeConfig) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO leave_types (id, label, subtracts_days, fixed_start, fixed_end)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                label = VALUES(label),
                subtracts_days = VALUES(subtracts_days),
                fixed_start = VALUES(fixed_start),
                fixed_end = VALUES(fixed_end)
            "#,
        )
        .bind(&leave_type.id)
        .bind(&leave_type.label)
        .bind(leave_type.subtracts_days)
        .bind(leave_type.fixed_range.map(|r| r.start))
        .bind(leave_type.fixed_range.map(|r| r.end))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_leave_type(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM leave_types WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_request(&self, id: &str) -> StoreResult<Option<Request>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = ?");
        sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Request::try_from)
            .transpose()
    }

    async fn list_requests(&self, filter: &RequestFilter) -> StoreResult<Vec<Request>> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<&str> = Vec::new();

        if let Some(employee_id) = filter.employee_id.as_deref() {
            where_sql.push_str(" AND employee_id = ?");
            args.push(employee_id);
        }
        if let Some(status) = &filter.status {
            where_sql.push_str(" AND status = ?");
            args.push(status.as_ref());
        }
        if let Some(type_id) = filter.type_id.as_deref() {
            where_sql.push_str(" AND type_id = ?");
            args.push(type_id);
        }

        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM requests{where_sql} ORDER BY created_at DESC"
        );
        debug!(sql = %sql, "Listing requests");

        let mut query = sqlx::query_as::<_, RequestRow>(&sql);
        for arg in args {
            query = query.bind(arg);
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Request::try_from)
            .collect()
    }

    async fn list_balance_entries(&self, employee_id: &str) -> StoreResult<Vec<BalanceEntry>> {
        let rows = sqlx::query_as::<_, BalanceEntryRow>(
            r#"
            SELECT id, employee_id, request_id, delta_days, delta_hours,
                   days_after, hours_after, reason, created_at
            FROM balance_entries
            WHERE employee_id = ?
            ORDER BY created_at, id
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(BalanceEntry::from).collect())
    }

    async fn commit(&self, change: ChangeSet) -> StoreResult<CommitReceipt> {
        let mut tx = self.pool.begin().await?;

        let request_id = match &change.request {
            RequestWrite::Insert(request) => {
                let id = if request.id.is_empty() {
                    Uuid::new_v4().to_string()
                } else {
                    request.id.clone()
                };
                let sql = format!(
                    "INSERT INTO requests ({REQUEST_COLUMNS}) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
                );
                sqlx::query(&sql)
                    .bind(&id)
                    .bind(&request.employee_id)
                    .bind(request.kind.type_id())
                    .bind(&request.label)
                    .bind(request.subtracts_days)
                    .bind(request.start_date)
                    .bind(request.end_date)
                    .bind(request.hours)
                    .bind(&request.reason)
                    .bind(request.status.as_ref())
                    .bind(request.created_at)
                    .bind(&request.admin_comment)
                    .bind(&request.reviewed_by)
                    .bind(request.created_by_admin)
                    .bind(request.consumed_hours)
                    .bind(usage_json(request)?)
                    .execute(&mut *tx)
                    .await?;
                id
            }
            RequestWrite::Update(request) => {
                ensure_row(&mut tx, "requests", &request.id).await?;
                sqlx::query(
                    r#"
                    UPDATE requests
                    SET type_id = ?, label = ?, subtracts_days = ?, start_date = ?,
                        end_date = ?, hours = ?,
                        reason = ?, status = ?, admin_comment = ?, reviewed_by = ?,
                        consumed_hours = ?, overtime_usage = ?
                    WHERE id = ?
                    "#,
                )
                .bind(request.kind.type_id())
                .bind(&request.label)
                .bind(request.subtracts_days)
                .bind(request.start_date)
                .bind(request.end_date)
                .bind(request.hours)
                .bind(&request.reason)
                .bind(request.status.as_ref())
                .bind(&request.admin_comment)
                .bind(&request.reviewed_by)
                .bind(request.consumed_hours)
                .bind(usage_json(request)?)
                .bind(&request.id)
                .execute(&mut *tx)
                .await?;
                request.id.clone()
            }
            RequestWrite::Delete(id) => {
                sqlx::query("DELETE FROM requests WHERE id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                id.clone()
            }
        };

        for c in &change.consumption {
            ensure_row(&mut tx, "requests", &c.source_id).await?;
            sqlx::query("UPDATE requests SET consumed_hours = ? WHERE id = ?")
                .bind(c.consumed_hours)
                .bind(&c.source_id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(balance) = &change.balance {
            // re-read under the row lock so concurrent writers from other
            // processes apply their deltas in sequence
            let current: Option<(Decimal, Decimal)> = sqlx::query_as(
                "SELECT days_available, overtime_hours FROM employees WHERE id = ? FOR UPDATE",
            )
            .bind(&balance.employee_id)
            .fetch_optional(&mut *tx)
            .await?;
            let Some((days, hours)) = current else {
                error!(employee_id = %balance.employee_id, "Balance target vanished mid-commit");
                return Err(StoreError::Corrupt {
                    table: "employees",
                    detail: format!("missing row {}", balance.employee_id),
                });
            };
            let days_after = days + balance.delta.delta_days;
            let hours_after = hours + balance.delta.delta_hours;
            if days_after != balance.days_available || hours_after != balance.overtime_hours {
                warn!(
                    employee_id = %balance.employee_id,
                    %days_after,
                    %hours_after,
                    "Balance moved since it was read, applying delta to the locked row"
                );
            }

            sqlx::query(
                "UPDATE employees SET days_available = ?, overtime_hours = ? WHERE id = ?",
            )
            .bind(days_after)
            .bind(hours_after)
            .bind(&balance.employee_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO balance_entries
                    (id, employee_id, request_id, delta_days, delta_hours,
                     days_after, hours_after, reason, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&balance.employee_id)
            .bind(&request_id)
            .bind(balance.delta.delta_days)
            .bind(balance.delta.delta_hours)
            .bind(days_after)
            .bind(hours_after)
            .bind(&balance.reason)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(CommitReceipt { request_id })
    }
}
