use crate::{
    auth::{
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    db::Store,
    error::{ApiError, ErrorBody},
    model::user::User,
    models::{AccessTokenResponse, LoginReqDto, MessageResponse, TokenType, UserInfo, non_empty},
};
use actix_web::{
    HttpRequest, HttpResponse,
    cookie::{Cookie, SameSite, time::Duration},
    web,
};
use tracing::{debug, info, instrument};

/// Cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "jwt";

fn user_info(user: &User) -> UserInfo {
    UserInfo {
        user_id: user.id,
        username: user.username.clone(),
        roles: user.roles.clone(),
    }
}

fn refresh_cookie(value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, value)
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(Duration::seconds(max_age_secs))
        .finish()
}

/// Login
#[utoipa::path(
    post,
    path = "/auth",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Access token issued, refresh token set as `jwt` cookie", body = AccessTokenResponse),
        (status = 400, description = "Missing username or password", body = ErrorBody),
        (status = 401, description = "Unknown user, inactive user or wrong password", body = ErrorBody),
        (status = 429, description = "Too many login attempts from this address", body = ErrorBody)
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip_all)]
pub async fn login(
    body: web::Json<LoginReqDto>,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let LoginReqDto { username, password } = body.into_inner();

    let (Some(username), Some(password)) = (non_empty(username), non_empty(password)) else {
        return Err(ApiError::Validation("All fields are required".into()));
    };

    let user = match store.find_user_by_username(&username).await? {
        Some(user) if user.active => user,
        _ => {
            info!(%username, "Invalid credentials: unknown or inactive user");
            return Err(ApiError::Unauthorized);
        }
    };

    if !verify_password(&password, &user.password) {
        info!(%username, "Invalid credentials: password mismatch");
        return Err(ApiError::Unauthorized);
    }

    let access_token = generate_access_token(
        user_info(&user),
        &config.access_token_secret,
        config.access_token_ttl,
    )?;
    let refresh_token = generate_refresh_token(
        user_info(&user),
        &config.refresh_token_secret,
        config.refresh_token_ttl,
    )?;

    info!(user_id = user.id, "Login successful");

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(refresh_token, config.refresh_token_ttl as i64))
        .json(AccessTokenResponse { access_token }))
}

/// Refresh
#[utoipa::path(
    get,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 401, description = "No refresh cookie, or its user is gone or inactive", body = ErrorBody),
        (status = 403, description = "Refresh token invalid or expired", body = ErrorBody)
    ),
    tag = "Auth"
)]
pub async fn refresh(
    req: HttpRequest,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let Some(cookie) = req.cookie(REFRESH_COOKIE) else {
        return Err(ApiError::Unauthorized);
    };

    let claims = verify_token(
        cookie.value(),
        &config.refresh_token_secret,
        TokenType::Refresh,
    )
    .map_err(|e| {
        debug!(error = %e, "Rejected refresh token");
        ApiError::Forbidden
    })?;

    // Roles may have changed since login, so reissue from the stored record.
    let user = match store.find_user_by_id(claims.user_info.user_id).await? {
        Some(user) if user.active => user,
        _ => return Err(ApiError::Unauthorized),
    };

    let access_token = generate_access_token(
        user_info(&user),
        &config.access_token_secret,
        config.access_token_ttl,
    )?;

    Ok(HttpResponse::Ok().json(AccessTokenResponse { access_token }))
}

/// Logout
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Refresh cookie cleared", body = MessageResponse),
        (status = 204, description = "There was no refresh cookie")
    ),
    tag = "Auth"
)]
pub async fn logout(req: HttpRequest) -> HttpResponse {
    if req.cookie(REFRESH_COOKIE).is_none() {
        return HttpResponse::NoContent().finish();
    }

    let mut cookie = refresh_cookie(String::new(), 0);
    cookie.make_removal();

    HttpResponse::Ok()
        .cookie(cookie)
        .json(MessageResponse::new("Cookie cleared"))
}
