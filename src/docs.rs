use crate::error::ErrorBody;
use crate::model::{
    note::{Note, NoteView},
    role::Role,
    user::UserView,
};
use crate::models::{
    AccessTokenResponse, CreateNoteReq, CreateUserReq, DeleteReq, LoginReqDto, MessageResponse,
    UpdateNoteReq, UpdateUserReq,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "NoteDesk API",
        version = "1.0.0",
        description = r#"
## Technical Notes Desk

Backend for a small repair shop: staff accounts with roles, and ticketed
technical notes assigned to them.

### Key Features
- **Authentication**
  - Login with username and password, short-lived access token plus a refresh cookie
- **User Management**
  - Create, update, list and delete staff accounts
- **Notes**
  - Ticketed notes, numbered from 500, assigned to a user and marked completed when done

### Security
`/users` and `/notes` require a **JWT Bearer** access token.
Employees only see and act on their own notes; Managers and Admins see all of them.

### Response Format
- JSON bodies; errors carry `message` and `isError`
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh,
        crate::auth::handlers::logout,

        crate::api::users::list_users,
        crate::api::users::create_user,
        crate::api::users::update_user,
        crate::api::users::delete_user,

        crate::api::notes::list_notes,
        crate::api::notes::create_note,
        crate::api::notes::update_note,
        crate::api::notes::delete_note
    ),
    components(
        schemas(
            Role,
            UserView,
            Note,
            NoteView,
            LoginReqDto,
            AccessTokenResponse,
            CreateUserReq,
            UpdateUserReq,
            CreateNoteReq,
            UpdateNoteReq,
            DeleteReq,
            MessageResponse,
            ErrorBody
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, token refresh and logout"),
        (name = "Users", description = "Staff account management APIs"),
        (name = "Notes", description = "Technical note APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
