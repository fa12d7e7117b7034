use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use super::lifecycle::LedgerEngine;
use crate::error::{LedgerResult, ValidationError};
use crate::model::{
    department::Department,
    employee::Employee,
    request::{Request, RequestFilter, RequestStatus},
};

/// Two or more employees of one department absent on the same day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ConflictRecord {
    #[schema(example = "2024-07-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "ops")]
    pub department_id: String,
    #[schema(example = "Operations")]
    pub department: String,
    #[schema(example = json!(["Alice Smith", "Bob Jones"]))]
    pub employee_names: Vec<String>,
}

fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let invalid = || ValidationError::InvalidMonth { year, month };
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    Ok((first, next.pred_opt().ok_or_else(invalid)?))
}

/// Scans `requests` for simultaneous absences within one month.
///
/// Only approved ordinary leave counts. Employees without a department
/// never conflict. Output is ordered by date, then department name.
pub fn detect_conflicts(
    year: i32,
    month: u32,
    department_filter: Option<&str>,
    requests: &[Request],
    employees: &[Employee],
    departments: &[Department],
) -> Result<Vec<ConflictRecord>, ValidationError> {
    let (first, last) = month_bounds(year, month)?;

    let employees: HashMap<&str, &Employee> =
        employees.iter().map(|e| (e.id.as_str(), e)).collect();
    let department_names: HashMap<&str, &str> = departments
        .iter()
        .map(|d| (d.id.as_str(), d.name.as_str()))
        .collect();

    let absences: Vec<(&Request, &Employee, &str)> = requests
        .iter()
        .filter(|r| r.status == RequestStatus::Approved && r.kind.is_absence())
        .filter_map(|r| {
            let employee = employees.get(r.employee_id.as_str())?;
            let department = employee.department_id.as_deref()?;
            if department_filter.is_some_and(|f| f != department) {
                return None;
            }
            Some((r, *employee, department))
        })
        .collect();

    let mut conflicts = Vec::new();
    for date in first.iter_days().take_while(|d| *d <= last) {
        // department -> employee id -> name
        let mut absent: BTreeMap<&str, BTreeMap<&str, &str>> = BTreeMap::new();
        for (request, employee, department) in &absences {
            let (from, to) = ordered(request.start_date, request.last_day());
            if from <= date && date <= to {
                absent
                    .entry(*department)
                    .or_default()
                    .insert(employee.id.as_str(), employee.full_name.as_str());
            }
        }

        let mut day_conflicts: Vec<ConflictRecord> = absent
            .into_iter()
            .filter(|(_, names)| names.len() > 1)
            .map(|(department_id, names)| {
                let mut employee_names: Vec<String> =
                    names.into_values().map(str::to_string).collect();
                employee_names.sort();
                ConflictRecord {
                    date,
                    department_id: department_id.to_string(),
                    department: department_names
                        .get(department_id)
                        .copied()
                        .unwrap_or(department_id)
                        .to_string(),
                    employee_names,
                }
            })
            .collect();
        day_conflicts.sort_by(|a, b| a.department.cmp(&b.department));
        conflicts.extend(day_conflicts);
    }

    Ok(conflicts)
}

fn ordered(a: NaiveDate, b: NaiveDate) -> (NaiveDate, NaiveDate) {
    if a <= b { (a, b) } else { (b, a) }
}

impl LedgerEngine {
    /// Re-derived from scratch on every call.
    pub async fn list_conflicts(
        &self,
        year: i32,
        month: u32,
        department_filter: Option<&str>,
    ) -> LedgerResult<Vec<ConflictRecord>> {
        let filter = RequestFilter::default().with_status(RequestStatus::Approved);
        let requests = self.store.list_requests(&filter).await?;
        let employees = self.store.list_employees().await?;
        let departments = self.store.list_departments().await?;
        Ok(detect_conflicts(
            year,
            month,
            department_filter,
            &requests,
            &employees,
            &departments,
        )?)
    }
}
