//! Request lifecycle: create, edit, review and delete, with balance effects
//! applied or reversed exactly once per committed state change.
//!
//! Every mutating operation runs read -> compute -> commit while holding the
//! engine's writer gate, so two operations can never interleave between
//! reading a balance and writing it back. Events go out after the gate is
//! released.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{debug, error, info, warn};

use super::catalog::LeaveTypeCatalog;
use super::consumption::resolve_usage;
use super::events::LedgerEvent;
use super::impact::{Impact, active_impact, parse_day};
use crate::error::{LedgerError, LedgerResult, StoreError, ValidationError};
use crate::model::{
    balance_entry::BalanceEntry,
    employee::{Employee, NewEmployee},
    leave_type::LeaveTypeConfig,
    request::{CONSUMPTION_EPSILON, Request, RequestDraft, RequestFilter, RequestKind, RequestStatus},
};
use crate::store::{BalanceWrite, ChangeSet, CommitReceipt, RequestWrite, Store};

const EVENT_CAPACITY: usize = 256;

/// What a lifecycle operation did to the owning employee's balances.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BalanceUpdate {
    /// The operation carried no balance effect.
    Unchanged,
    Applied {
        employee_id: String,
        delta: Impact,
        days_available: Decimal,
        overtime_hours: Decimal,
    },
    /// The employee no longer resolves; the request change was still committed.
    Skipped { employee_id: String, delta: Impact },
}

#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub balance: BalanceUpdate,
}

impl<T> Outcome<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self.balance, BalanceUpdate::Skipped { .. })
    }

    pub fn warning(&self) -> Option<String> {
        match &self.balance {
            BalanceUpdate::Skipped { employee_id, .. } => Some(format!(
                "employee {employee_id} not found; balances were not updated"
            )),
            _ => None,
        }
    }
}

pub struct LedgerEngine {
    pub(super) store: Arc<dyn Store>,
    catalog: RwLock<Arc<LeaveTypeCatalog>>,
    writer: Mutex<()>,
    events: broadcast::Sender<LedgerEvent>,
}

impl LedgerEngine {
    pub async fn new(store: Arc<dyn Store>) -> LedgerResult<Self> {
        let types = store.list_leave_types().await?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        info!(leave_types = types.len(), "Ledger engine ready");
        Ok(Self {
            store,
            catalog: RwLock::new(Arc::new(LeaveTypeCatalog::new(types))),
            writer: Mutex::new(()),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    pub async fn catalog(&self) -> Arc<LeaveTypeCatalog> {
        self.catalog.read().await.clone()
    }

    /// Previews the impact of a draft without touching any state. Dates that
    /// do not parse give no day effect.
    pub async fn compute_impact(
        &self,
        type_id: &str,
        start_date: &str,
        end_date: Option<&str>,
        hours: Option<Decimal>,
    ) -> Impact {
        let (start, end) = match (parse_day(start_date), end_date.map(parse_day)) {
            (Some(start), None) => (Some(start), None),
            (Some(start), Some(Some(end))) => (Some(start), Some(end)),
            _ => (None, None),
        };
        let kind = RequestKind::from_type_id(type_id);
        let impact = self.catalog().await.impact_of(&kind, start, end, hours);
        debug!(type_id, ?impact, "Computed impact preview");
        impact
    }

    pub async fn create_request(
        &self,
        mut draft: RequestDraft,
        employee_id: &str,
        initial_status: RequestStatus,
        created_by_admin: bool,
    ) -> LedgerResult<Outcome<Request>> {
        let guard = self.writer.lock().await;
        let catalog = self.catalog().await;

        catalog.apply_fixed_range(&mut draft);
        validate_dates(&draft)?;
        let kind = RequestKind::from_type_id(&draft.type_id);
        let (hours, overtime_usage) = resolve_usage(&kind, draft.hours, draft.overtime_usage)?;

        let mut request = Request {
            id: String::new(),
            employee_id: employee_id.to_string(),
            label: catalog.label_for(&kind),
            subtracts_days: catalog.subtracts_days(kind.type_id()),
            kind,
            start_date: draft.start_date,
            end_date: draft.end_date,
            hours,
            reason: draft.reason,
            status: initial_status,
            created_at: Utc::now(),
            admin_comment: None,
            reviewed_by: None,
            created_by_admin,
            consumed_hours: Decimal::ZERO,
            overtime_usage,
        };

        let consumption = self
            .plan_consumption(employee_id, &[], request.active_usage())
            .await?;
        let delta = active_impact(&request);
        let (balance_write, balance) = self.prepare_balance(employee_id, delta, "create").await?;

        let receipt = self
            .commit(ChangeSet {
                request: RequestWrite::Insert(request.clone()),
                balance: balance_write,
                consumption,
            })
            .await?;
        request.id = receipt.request_id;
        drop(guard);

        info!(
            request_id = %request.id,
            employee_id,
            type_id = %request.kind,
            status = %request.status,
            "Request created"
        );
        self.publish(
            LedgerEvent::RequestCreated {
                request_id: request.id.clone(),
                employee_id: request.employee_id.clone(),
                status: request.status,
            },
            &balance,
        );

        Ok(Outcome {
            value: request,
            balance,
        })
    }

    /// Replaces the requester-editable fields of a still-pending request.
    pub async fn update_request(
        &self,
        request_id: &str,
        mut draft: RequestDraft,
    ) -> LedgerResult<Outcome<Request>> {
        let guard = self.writer.lock().await;
        let catalog = self.catalog().await;
        let current = self.load(request_id).await?;

        if current.status != RequestStatus::Pending {
            return Err(ValidationError::NotEditable(current.status).into());
        }

        catalog.apply_fixed_range(&mut draft);
        validate_dates(&draft)?;
        let kind = RequestKind::from_type_id(&draft.type_id);
        let (hours, overtime_usage) = resolve_usage(&kind, draft.hours, draft.overtime_usage)?;

        let mut updated = current.clone();
        updated.label = catalog.label_for(&kind);
        updated.subtracts_days = catalog.subtracts_days(kind.type_id());
        updated.kind = kind;
        updated.start_date = draft.start_date;
        updated.end_date = draft.end_date;
        updated.hours = hours;
        updated.reason = draft.reason;
        updated.overtime_usage = overtime_usage;

        let consumption = self
            .plan_consumption(
                &current.employee_id,
                current.active_usage(),
                updated.active_usage(),
            )
            .await?;
        // only adjustments carry an active effect while pending
        let delta = active_impact(&updated) - active_impact(&current);
        let (balance_write, balance) = self
            .prepare_balance(&current.employee_id, delta, "edit")
            .await?;

        self.commit(ChangeSet {
            request: RequestWrite::Update(updated.clone()),
            balance: balance_write,
            consumption,
        })
        .await?;
        drop(guard);

        info!(request_id, employee_id = %updated.employee_id, "Request updated");
        self.publish(
            LedgerEvent::RequestUpdated {
                request_id: updated.id.clone(),
                employee_id: updated.employee_id.clone(),
            },
            &balance,
        );

        Ok(Outcome {
            value: updated,
            balance,
        })
    }

    /// Moves a request between `PENDING`, `APPROVED` and `REJECTED`.
    /// Entering `APPROVED` applies the impact; leaving it reverses the impact.
    pub async fn set_request_status(
        &self,
        request_id: &str,
        status: RequestStatus,
        reviewer_id: &str,
        comment: Option<String>,
    ) -> LedgerResult<Outcome<Request>> {
        let guard = self.writer.lock().await;
        let current = self.load(request_id).await?;

        if current.status == RequestStatus::Approved && status != RequestStatus::Approved {
            ensure_unconsumed(&current)?;
        }

        let mut updated = current.clone();
        updated.status = status;
        updated.reviewed_by = Some(reviewer_id.to_string());
        if comment.is_some() {
            updated.admin_comment = comment;
        }

        let consumption = self
            .plan_consumption(
                &current.employee_id,
                current.active_usage(),
                updated.active_usage(),
            )
            .await?;
        let delta = active_impact(&updated) - active_impact(&current);
        let reason = format!("status {} -> {}", current.status, status);
        let (balance_write, balance) = self
            .prepare_balance(&current.employee_id, delta, &reason)
            .await?;

        self.commit(ChangeSet {
            request: RequestWrite::Update(updated.clone()),
            balance: balance_write,
            consumption,
        })
        .await?;
        drop(guard);

        info!(
            request_id,
            employee_id = %updated.employee_id,
            from = %current.status,
            to = %status,
            reviewer_id,
            "Request status changed"
        );
        self.publish(
            LedgerEvent::RequestStatusChanged {
                request_id: updated.id.clone(),
                employee_id: updated.employee_id.clone(),
                from: current.status,
                to: status,
                reviewer_id: reviewer_id.to_string(),
            },
            &balance,
        );

        Ok(Outcome {
            value: updated,
            balance,
        })
    }

    /// Removes a request, reversing its balance effect first if it is active.
    /// Returns the removed record.
    pub async fn delete_request(&self, request_id: &str) -> LedgerResult<Outcome<Request>> {
        let guard = self.writer.lock().await;
        let current = self.load(request_id).await?;

        ensure_unconsumed(&current)?;

        let consumption = self
            .plan_consumption(&current.employee_id, current.active_usage(), &[])
            .await?;
        let delta = -active_impact(&current);
        let (balance_write, balance) = self
            .prepare_balance(&current.employee_id, delta, "delete")
            .await?;

        self.commit(ChangeSet {
            request: RequestWrite::Delete(current.id.clone()),
            balance: balance_write,
            consumption,
        })
        .await?;
        drop(guard);

        info!(request_id, employee_id = %current.employee_id, "Request deleted");
        self.publish(
            LedgerEvent::RequestDeleted {
                request_id: current.id.clone(),
                employee_id: current.employee_id.clone(),
            },
            &balance,
        );

        Ok(Outcome {
            value: current,
            balance,
        })
    }

    pub async fn get_request(&self, request_id: &str) -> LedgerResult<Request> {
        self.load(request_id).await
    }

    pub async fn list_requests(&self, filter: &RequestFilter) -> LedgerResult<Vec<Request>> {
        Ok(self.store.list_requests(filter).await?)
    }

    pub async fn employee(&self, employee_id: &str) -> LedgerResult<Employee> {
        self.store
            .get_employee(employee_id)
            .await?
            .ok_or_else(|| LedgerError::EmployeeNotFound(employee_id.to_string()))
    }

    pub async fn list_employees(&self) -> LedgerResult<Vec<Employee>> {
        Ok(self.store.list_employees().await?)
    }

    pub async fn onboard_employee(&self, employee: NewEmployee) -> LedgerResult<Employee> {
        let employee = self.store.insert_employee(employee).await?;
        info!(employee_id = %employee.id, role = %employee.role, "Employee onboarded");
        Ok(employee)
    }

    pub async fn balance_history(&self, employee_id: &str) -> LedgerResult<Vec<BalanceEntry>> {
        Ok(self.store.list_balance_entries(employee_id).await?)
    }

    /// Administrative path; never called while processing requests.
    pub async fn upsert_leave_type(&self, leave_type: LeaveTypeConfig) -> LedgerResult<()> {
        let _guard = self.writer.lock().await;
        self.store.upsert_leave_type(&leave_type).await?;
        info!(type_id = %leave_type.id, subtracts_days = leave_type.subtracts_days, "Leave type saved");
        self.reload_catalog().await
    }

    pub async fn remove_leave_type(&self, type_id: &str) -> LedgerResult<bool> {
        let _guard = self.writer.lock().await;
        let removed = self.store.delete_leave_type(type_id).await?;
        if removed {
            info!(type_id, "Leave type removed");
            self.reload_catalog().await?;
        }
        Ok(removed)
    }

    async fn reload_catalog(&self) -> LedgerResult<()> {
        let types = self.store.list_leave_types().await?;
        *self.catalog.write().await = Arc::new(LeaveTypeCatalog::new(types));
        Ok(())
    }

    async fn load(&self, request_id: &str) -> LedgerResult<Request> {
        self.store
            .get_request(request_id)
            .await?
            .ok_or_else(|| LedgerError::RequestNotFound(request_id.to_string()))
    }

    /// Reads the employee and computes the balance write for `delta`. A
    /// missing employee degrades to `Skipped` instead of failing.
    async fn prepare_balance(
        &self,
        employee_id: &str,
        delta: Impact,
        reason: &str,
    ) -> LedgerResult<(Option<BalanceWrite>, BalanceUpdate)> {
        if delta.is_zero() {
            return Ok((None, BalanceUpdate::Unchanged));
        }

        let Some(employee) = self.store.get_employee(employee_id).await? else {
            warn!(
                employee_id,
                delta_days = %delta.delta_days,
                delta_hours = %delta.delta_hours,
                reason,
                "Employee not found, skipping balance mutation"
            );
            return Ok((
                None,
                BalanceUpdate::Skipped {
                    employee_id: employee_id.to_string(),
                    delta,
                },
            ));
        };

        let days_available = employee.days_available + delta.delta_days;
        let overtime_hours = employee.overtime_hours + delta.delta_hours;
        debug!(employee_id, ?delta, %days_available, %overtime_hours, "Balance computed");

        Ok((
            Some(BalanceWrite {
                employee_id: employee_id.to_string(),
                delta,
                days_available,
                overtime_hours,
                reason: reason.to_string(),
            }),
            BalanceUpdate::Applied {
                employee_id: employee_id.to_string(),
                delta,
                days_available,
                overtime_hours,
            },
        ))
    }

    async fn commit(&self, change: ChangeSet) -> LedgerResult<CommitReceipt> {
        self.store.commit(change).await.map_err(|e: StoreError| {
            error!(error = %e, "Ledger commit failed");
            LedgerError::from(e)
        })
    }

    fn publish(&self, event: LedgerEvent, balance: &BalanceUpdate) {
        // no subscribers is fine
        let _ = self.events.send(event);
        if let BalanceUpdate::Applied {
            employee_id,
            delta,
            days_available,
            overtime_hours,
        } = balance
        {
            let _ = self.events.send(LedgerEvent::BalanceChanged {
                employee_id: employee_id.clone(),
                delta: *delta,
                days_available: *days_available,
                overtime_hours: *overtime_hours,
            });
        }
    }
}

fn validate_dates(draft: &RequestDraft) -> Result<(), ValidationError> {
    match draft.end_date {
        Some(end) if end < draft.start_date => Err(ValidationError::EndBeforeStart),
        _ => Ok(()),
    }
}

/// An earn record that has been drawn from must stay approved.
fn ensure_unconsumed(request: &Request) -> Result<(), ValidationError> {
    if request.kind.is_overtime_source() && request.consumed_hours > CONSUMPTION_EPSILON {
        return Err(ValidationError::SourceInUse {
            request_id: request.id.clone(),
            consumed: request.consumed_hours,
        });
    }
    Ok(())
}
