use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One applied balance mutation, written in the same commit as the change itself.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BalanceEntry {
    pub id: String,
    pub employee_id: String,
    pub request_id: String,
    #[schema(value_type = String)]
    pub delta_days: Decimal,
    #[schema(value_type = String)]
    pub delta_hours: Decimal,
    #[schema(value_type = String)]
    pub days_after: Decimal,
    #[schema(value_type = String)]
    pub hours_after: Decimal,
    #[schema(example = "approved")]
    pub reason: String,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}
