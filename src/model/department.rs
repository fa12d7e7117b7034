use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Department {
    #[schema(example = "ops")]
    pub id: String,
    #[schema(example = "Operations")]
    pub name: String,
}
