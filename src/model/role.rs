use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin = 1,
    Supervisor = 2,
    Worker = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Supervisor),
            3 => Some(Role::Worker),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Supervisors and admins may approve or reject requests.
    pub fn can_review(self) -> bool {
        matches!(self, Role::Admin | Role::Supervisor)
    }
}
