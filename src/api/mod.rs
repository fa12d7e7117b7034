pub mod conflicts;
pub mod employee;
pub mod leave_types;
pub mod overtime;
pub mod requests;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::ledger::{BalanceUpdate, Outcome};
use crate::model::request::Request;

/// Body of every endpoint that runs a lifecycle operation.
#[derive(Serialize, ToSchema)]
pub struct LifecycleResponse {
    pub data: Request,
    #[schema(value_type = Object, example = json!({
        "result": "applied",
        "employee_id": "emp-001",
        "delta": { "delta_days": "-3", "delta_hours": "0" },
        "days_available": "19",
        "overtime_hours": "6.5"
    }))]
    pub balance: BalanceUpdate,
    /// Present when the request changed but balances could not be updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<Outcome<Request>> for LifecycleResponse {
    fn from(outcome: Outcome<Request>) -> Self {
        let warning = outcome.warning();
        LifecycleResponse {
            data: outcome.value,
            balance: outcome.balance,
            warning,
        }
    }
}

/// One page cut from an already filtered, ordered listing.
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn slice(rows: Vec<T>, page: Option<u32>, per_page: Option<u32>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(20).clamp(1, 100);
        let total = rows.len();
        let offset = (page as usize - 1) * per_page as usize;
        let data = rows
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .collect();
        Page {
            data,
            page,
            per_page,
            total,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    /// Items per page
    pub per_page: Option<u32>,
}
