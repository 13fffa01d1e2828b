use crate::{
    auth::{auth::AuthUser, password::hash_password},
    db::Store,
    error::{ApiError, ErrorBody},
    model::{
        role::Role,
        user::{NewUser, UserView},
    },
    models::{CreateUserReq, DeleteReq, MessageResponse, UpdateUserReq, non_empty},
};
use actix_web::{HttpResponse, web};
use tracing::info;

/// List users
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users, passwords omitted", body = [UserView]),
        (status = 400, description = "No users found", body = ErrorBody)
    ),
    tag = "Users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(store: web::Data<dyn Store>) -> Result<HttpResponse, ApiError> {
    let users: Vec<UserView> = store.list_users().await?.iter().map(|u| u.view()).collect();

    if users.is_empty() {
        return Err(ApiError::NotFound("No users found".into()));
    }

    Ok(HttpResponse::Ok().json(users))
}

/// Create user
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserReq,
    responses(
        (status = 201, description = "User created", body = MessageResponse, example = json!({
            "message": "New user Dave created"
        })),
        (status = 400, description = "Missing username or password", body = ErrorBody),
        (status = 403, description = "Only Managers and Admins grant non-default roles", body = ErrorBody),
        (status = 409, description = "Username taken, ignoring case", body = ErrorBody)
    ),
    tag = "Users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_user(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    body: web::Json<CreateUserReq>,
) -> Result<HttpResponse, ApiError> {
    let CreateUserReq {
        username,
        password,
        roles,
    } = body.into_inner();

    let (Some(username), Some(password)) = (non_empty(username), non_empty(password)) else {
        return Err(ApiError::Validation("All fields are required".into()));
    };

    let roles = roles.filter(|r| !r.is_empty()).unwrap_or_else(Role::defaults);
    if roles != Role::defaults() {
        auth.require_account_admin()?;
    }

    if store.find_user_by_username(&username).await?.is_some() {
        return Err(ApiError::Conflict("Duplicate username".into()));
    }

    let user = store
        .insert_user(NewUser {
            username,
            password: hash_password(&password)?,
            roles,
        })
        .await?;

    info!(user_id = user.id, username = %user.username, "User created");

    Ok(HttpResponse::Created().json(MessageResponse::new(format!(
        "New user {} created",
        user.username
    ))))
}

/// Update user
#[utoipa::path(
    patch,
    path = "/users",
    request_body = UpdateUserReq,
    responses(
        (status = 200, description = "User updated", body = MessageResponse, example = json!({
            "message": "Dave updated"
        })),
        (status = 400, description = "Missing fields or unknown user", body = ErrorBody),
        (status = 403, description = "Only Managers and Admins change roles or the active flag", body = ErrorBody),
        (status = 409, description = "Username taken by another user", body = ErrorBody)
    ),
    tag = "Users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_user(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    body: web::Json<UpdateUserReq>,
) -> Result<HttpResponse, ApiError> {
    let UpdateUserReq {
        id,
        username,
        roles,
        active,
        password,
    } = body.into_inner();

    let (Some(id), Some(username), Some(roles), Some(active)) =
        (id, non_empty(username), roles.filter(|r| !r.is_empty()), active)
    else {
        return Err(ApiError::Validation(
            "All fields except password are required".into(),
        ));
    };

    let Some(mut user) = store.find_user_by_id(id).await? else {
        return Err(ApiError::NotFound("User not found".into()));
    };

    if roles != user.roles || active != user.active {
        auth.require_account_admin()?;
    }

    // Renaming to a case variant of one's own name is allowed.
    if let Some(duplicate) = store.find_user_by_username(&username).await? {
        if duplicate.id != id {
            return Err(ApiError::Conflict("Duplicate username".into()));
        }
    }

    user.username = username;
    user.roles = roles;
    user.active = active;

    if let Some(password) = non_empty(password) {
        user.password = hash_password(&password)?;
    }

    store.update_user(&user).await?;
    info!(user_id = user.id, "User updated");

    Ok(HttpResponse::Ok().json(MessageResponse::new(format!("{} updated", user.username))))
}

/// Delete user
#[utoipa::path(
    delete,
    path = "/users",
    request_body = DeleteReq,
    responses(
        (status = 200, description = "User deleted", body = MessageResponse, example = json!({
            "message": "Username Dave with ID 1 deleted"
        })),
        (status = 400, description = "Missing id, unknown user, or user still owns notes", body = ErrorBody)
    ),
    tag = "Users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_user(
    store: web::Data<dyn Store>,
    body: web::Json<DeleteReq>,
) -> Result<HttpResponse, ApiError> {
    let Some(id) = body.id else {
        return Err(ApiError::Validation("User ID Required".into()));
    };

    if store.user_has_notes(id).await? {
        return Err(ApiError::Validation("User has assigned notes".into()));
    }

    let Some(user) = store.find_user_by_id(id).await? else {
        return Err(ApiError::NotFound("User not found".into()));
    };

    if !store.delete_user(id).await? {
        return Err(ApiError::NotFound("User not found".into()));
    }

    info!(user_id = id, "User deleted");

    Ok(HttpResponse::Ok().json(MessageResponse::new(format!(
        "Username {} with ID {} deleted",
        user.username, user.id
    ))))
}
