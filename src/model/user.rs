use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::role::Role;

/// Stored user record. `password` holds the argon2 PHC string and never
/// leaves the server; responses use [`UserView`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub roles: Vec<Role>,
    pub active: bool,
}

/// Fields needed to insert a user; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct UserView {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Dave")]
    pub username: String,
    pub roles: Vec<Role>,
    #[schema(example = true)]
    pub active: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            roles: user.roles.clone(),
            active: user.active,
        }
    }
}

impl User {
    pub fn view(&self) -> UserView {
        UserView::from(self)
    }
}
