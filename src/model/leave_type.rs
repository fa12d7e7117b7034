use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A date pair that pins every request of a leave type to the same span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FixedRange {
    #[schema(example = "2024-12-24", format = "date", value_type = String)]
    pub start: NaiveDate,
    #[schema(example = "2024-12-26", format = "date", value_type = String)]
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "VACATION",
    "label": "Vacation",
    "subtracts_days": true,
    "fixed_range": null
}))]
pub struct LeaveTypeConfig {
    pub id: String,
    pub label: String,
    pub subtracts_days: bool,
    #[serde(default)]
    pub fixed_range: Option<FixedRange>,
}
