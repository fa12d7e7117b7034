use serde::Serialize;

use super::impact::Impact;
use crate::model::request::RequestStatus;
use rust_decimal::Decimal;

/// Published after a lifecycle operation has been committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    RequestCreated {
        request_id: String,
        employee_id: String,
        status: RequestStatus,
    },
    RequestUpdated {
        request_id: String,
        employee_id: String,
    },
    RequestStatusChanged {
        request_id: String,
        employee_id: String,
        from: RequestStatus,
        to: RequestStatus,
        reviewer_id: String,
    },
    RequestDeleted {
        request_id: String,
        employee_id: String,
    },
    BalanceChanged {
        employee_id: String,
        delta: Impact,
        days_available: Decimal,
        overtime_hours: Decimal,
    },
}

impl LedgerEvent {
    pub fn employee_id(&self) -> &str {
        match self {
            LedgerEvent::RequestCreated { employee_id, .. }
            | LedgerEvent::RequestUpdated { employee_id, .. }
            | LedgerEvent::RequestStatusChanged { employee_id, .. }
            | LedgerEvent::RequestDeleted { employee_id, .. }
            | LedgerEvent::BalanceChanged { employee_id, .. } => employee_id,
        }
    }
}
