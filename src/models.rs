use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

// Request bodies keep every field optional so that a missing field is
// answered with the handler's own validation message.

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "Dave")]
    pub username: Option<String>,
    #[schema(example = "secret")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateUserReq {
    #[schema(example = "Dave")]
    pub username: Option<String>,
    #[schema(example = "secret")]
    pub password: Option<String>,
    pub roles: Option<Vec<Role>>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserReq {
    #[schema(example = 1)]
    pub id: Option<u64>,
    #[schema(example = "Dave")]
    pub username: Option<String>,
    pub roles: Option<Vec<Role>>,
    pub active: Option<bool>,
    /// Re-hashed when present and non-empty.
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DeleteReq {
    #[schema(example = 1)]
    pub id: Option<u64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateNoteReq {
    /// Owning user id.
    #[schema(example = 1)]
    pub user: Option<u64>,
    #[schema(example = "Printer jam")]
    pub title: Option<String>,
    #[schema(example = "Front desk printer keeps jamming")]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateNoteReq {
    #[schema(example = 1)]
    pub id: Option<u64>,
    #[schema(example = 1)]
    pub user: Option<u64>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "New user Dave created")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Identity carried inside every token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub user_id: u64,
    pub username: String,
    pub roles: Vec<Role>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "UserInfo")]
    pub user_info: UserInfo,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}

/// Returns the value when it is present and not blank.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_count_as_missing() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some("Dave".into())), Some("Dave".into()));
    }

    #[test]
    fn access_token_response_uses_camel_case() {
        let json = serde_json::to_value(AccessTokenResponse {
            access_token: "t".into(),
        })
        .unwrap();
        assert_eq!(json["accessToken"], "t");
    }
}
