use crate::{error::ApiError, model::role::Role, models::UserInfo};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

/// Caller identity established by [`auth_middleware`](super::middleware::auth_middleware).
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub roles: Vec<Role>,
}

impl From<UserInfo> for AuthUser {
    fn from(info: UserInfo) -> Self {
        Self {
            user_id: info.user_id,
            username: info.username,
            roles: info.roles,
        }
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    // Only routes behind the auth middleware find an identity here.
    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| ApiError::Unauthorized.into()),
        )
    }
}

impl AuthUser {
    pub fn sees_all_notes(&self) -> bool {
        self.roles.iter().any(|r| r.sees_all_notes())
    }

    /// Employees only act on notes they own.
    pub fn require_note_access(&self, owner_id: u64) -> Result<(), ApiError> {
        if self.sees_all_notes() || self.user_id == owner_id {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }

    /// Granting roles or (de)activating accounts needs Manager or Admin.
    pub fn require_account_admin(&self) -> Result<(), ApiError> {
        if self.sees_all_notes() {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}
