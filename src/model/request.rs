use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Largest number of fractional digits the durable store keeps for hours.
pub const MAX_HOURS_SCALE: u32 = 4;

/// Hours below this are treated as floating-point residue when deciding
/// whether an earn record still has capacity.
pub const CONSUMPTION_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// The closed set of request types. Every configurable leave type maps to
/// `Leave`; the rest carry fixed ledger rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestKind {
    Leave(String),
    OvertimeEarn,
    OvertimeSpendDays,
    OvertimePay,
    AdjustmentDays,
    AdjustmentOvertime,
    WorkedHoliday,
}

impl RequestKind {
    pub const OVERTIME_EARN: &'static str = "OVERTIME_EARN";
    pub const OVERTIME_SPEND_DAYS: &'static str = "OVERTIME_SPEND_DAYS";
    pub const OVERTIME_PAY: &'static str = "OVERTIME_PAY";
    pub const ADJUSTMENT_DAYS: &'static str = "ADJUSTMENT_DAYS";
    pub const ADJUSTMENT_OVERTIME: &'static str = "ADJUSTMENT_OVERTIME";
    pub const WORKED_HOLIDAY: &'static str = "WORKED_HOLIDAY";

    pub fn from_type_id(type_id: &str) -> Self {
        match type_id {
            Self::OVERTIME_EARN => RequestKind::OvertimeEarn,
            Self::OVERTIME_SPEND_DAYS => RequestKind::OvertimeSpendDays,
            Self::OVERTIME_PAY => RequestKind::OvertimePay,
            Self::ADJUSTMENT_DAYS => RequestKind::AdjustmentDays,
            Self::ADJUSTMENT_OVERTIME => RequestKind::AdjustmentOvertime,
            Self::WORKED_HOLIDAY => RequestKind::WorkedHoliday,
            other => RequestKind::Leave(other.to_string()),
        }
    }

    pub fn type_id(&self) -> &str {
        match self {
            RequestKind::Leave(id) => id,
            RequestKind::OvertimeEarn => Self::OVERTIME_EARN,
            RequestKind::OvertimeSpendDays => Self::OVERTIME_SPEND_DAYS,
            RequestKind::OvertimePay => Self::OVERTIME_PAY,
            RequestKind::AdjustmentDays => Self::ADJUSTMENT_DAYS,
            RequestKind::AdjustmentOvertime => Self::ADJUSTMENT_OVERTIME,
            RequestKind::WorkedHoliday => Self::WORKED_HOLIDAY,
        }
    }

    /// Label used when the catalog has no entry for this type.
    pub fn builtin_label(&self) -> Option<&'static str> {
        match self {
            RequestKind::Leave(_) => None,
            RequestKind::OvertimeEarn => Some("Overtime earned"),
            RequestKind::OvertimeSpendDays => Some("Overtime taken as days off"),
            RequestKind::OvertimePay => Some("Overtime paid out"),
            RequestKind::AdjustmentDays => Some("Day balance adjustment"),
            RequestKind::AdjustmentOvertime => Some("Overtime balance adjustment"),
            RequestKind::WorkedHoliday => Some("Worked holiday"),
        }
    }

    /// Adjustments bypass the approval gate.
    pub fn is_adjustment(&self) -> bool {
        matches!(
            self,
            RequestKind::AdjustmentDays | RequestKind::AdjustmentOvertime
        )
    }

    /// Requests that draw down previously earned overtime.
    pub fn consumes_overtime(&self) -> bool {
        matches!(self, RequestKind::OvertimeSpendDays | RequestKind::OvertimePay)
    }

    /// Records that can be drawn from by a consuming request.
    pub fn is_overtime_source(&self) -> bool {
        matches!(self, RequestKind::OvertimeEarn | RequestKind::WorkedHoliday)
    }

    /// Ordinary leave, the only kind that counts toward absence conflicts.
    pub fn is_absence(&self) -> bool {
        matches!(self, RequestKind::Leave(_))
    }
}

impl From<String> for RequestKind {
    fn from(value: String) -> Self {
        RequestKind::from_type_id(&value)
    }
}

impl From<RequestKind> for String {
    fn from(value: RequestKind) -> Self {
        value.type_id().to_string()
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_id())
    }
}

/// Hours drawn from one earn record by a consuming request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OvertimeUsage {
    #[schema(example = "b0c1d2e3")]
    pub source_id: String,
    #[schema(value_type = String, example = "4.5")]
    pub hours_used: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "6f1c2d0e-3b7a-4c55-9a51-1f0c8e2b7d11",
    "employee_id": "emp-001",
    "type_id": "VACATION",
    "label": "Vacation",
    "subtracts_days": true,
    "start_date": "2024-06-10",
    "end_date": "2024-06-12",
    "hours": null,
    "reason": "Family trip",
    "status": "PENDING",
    "created_at": "2024-05-01T09:30:00Z",
    "admin_comment": null,
    "reviewed_by": null,
    "created_by_admin": false,
    "consumed_hours": "0",
    "overtime_usage": null
}))]
pub struct Request {
    pub id: String,
    pub employee_id: String,
    #[serde(rename = "type_id")]
    #[schema(value_type = String, example = "VACATION")]
    pub kind: RequestKind,
    pub label: String,
    /// The type's day-subtraction flag as of the last create or edit.
    /// Balance reversals use this, never the live catalog.
    #[serde(default)]
    pub subtracts_days: bool,
    #[schema(example = "2024-06-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-06-12", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub hours: Option<Decimal>,
    pub reason: Option<String>,
    pub status: RequestStatus,
    #[schema(example = "2024-05-01T09:30:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    pub admin_comment: Option<String>,
    pub reviewed_by: Option<String>,
    pub created_by_admin: bool,
    /// Hours already drawn from this record. Only meaningful on earn records.
    #[schema(value_type = String)]
    pub consumed_hours: Decimal,
    pub overtime_usage: Option<Vec<OvertimeUsage>>,
}

impl Request {
    /// Whether this request's ledger impact is currently reflected in the
    /// employee's balances.
    pub fn balance_effect_active(&self) -> bool {
        self.kind.is_adjustment() || self.status == RequestStatus::Approved
    }

    /// Capacity left on an earn record.
    pub fn remaining_hours(&self) -> Decimal {
        self.hours.unwrap_or_default() - self.consumed_hours
    }

    /// Usage entries that currently hold capacity on their sources.
    pub fn active_usage(&self) -> &[OvertimeUsage] {
        if self.status == RequestStatus::Rejected {
            return &[];
        }
        self.overtime_usage.as_deref().unwrap_or_default()
    }

    /// Inclusive last day of the request.
    pub fn last_day(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.start_date)
    }
}

/// Fields a requester supplies on create and edit.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "type_id": "OVERTIME_PAY",
    "start_date": "2024-06-10",
    "end_date": null,
    "hours": "5",
    "reason": "Payout",
    "overtime_usage": [{ "source_id": "b0c1d2e3", "hours_used": "5" }]
}))]
pub struct RequestDraft {
    pub type_id: String,
    #[schema(example = "2024-06-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[serde(default)]
    #[schema(format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub hours: Option<Decimal>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub overtime_usage: Option<Vec<OvertimeUsage>>,
}

/// Equality filters for request listings.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub employee_id: Option<String>,
    pub status: Option<RequestStatus>,
    pub type_id: Option<String>,
}

impl RequestFilter {
    pub fn for_employee(employee_id: &str) -> Self {
        Self {
            employee_id: Some(employee_id.to_string()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: RequestStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, request: &Request) -> bool {
        self.employee_id
            .as_deref()
            .is_none_or(|id| id == request.employee_id)
            && self.status.is_none_or(|s| s == request.status)
            && self
                .type_id
                .as_deref()
                .is_none_or(|t| t == request.kind.type_id())
    }
}
