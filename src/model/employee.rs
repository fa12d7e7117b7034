use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": "emp-001",
        "full_name": "John Doe",
        "role": "worker",
        "department_id": "ops",
        "days_available": "22",
        "overtime_hours": "6.5"
    })
)]
pub struct Employee {
    #[schema(example = "emp-001")]
    pub id: String,

    #[schema(example = "John Doe")]
    pub full_name: String,

    pub role: Role,

    #[schema(example = "ops", nullable = true)]
    pub department_id: Option<String>,

    /// Remaining leave days. May go negative.
    #[schema(value_type = String, example = "22")]
    pub days_available: Decimal,

    /// Banked overtime hours. May go negative.
    #[schema(value_type = String, example = "6.5")]
    pub overtime_hours: Decimal,
}

/// Onboarding payload; the store assigns the id.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewEmployee {
    #[schema(example = "Jane Roe")]
    pub full_name: String,
    pub role: Role,
    #[schema(example = "ops")]
    pub department_id: Option<String>,
    #[serde(default)]
    #[schema(value_type = String, example = "22")]
    pub days_available: Decimal,
    #[serde(default)]
    #[schema(value_type = String, example = "0")]
    pub overtime_hours: Decimal,
}
