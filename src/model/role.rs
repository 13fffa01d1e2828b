use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub enum Role {
    Employee,
    Manager,
    Admin,
}

impl Role {
    /// Roles given to a user created without an explicit role list.
    pub fn defaults() -> Vec<Role> {
        vec![Role::Employee]
    }

    /// Managers and admins act on every note, not just their own.
    pub fn sees_all_notes(self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }
}
