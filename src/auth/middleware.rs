use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::TokenType;
use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use anyhow::anyhow;
use tracing::debug;

/// Token from `Authorization: Bearer <token>`, if well formed.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Missing or malformed credential answers 401, a bad or expired token 403.
/// On success the caller's [`AuthUser`] is attached to the request.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let Some(config) = req.app_data::<Data<Config>>().cloned() else {
        return Ok(req.error_response(ApiError::Internal(anyhow!("App config missing"))));
    };

    let Some(token) = bearer_token(req.headers()).map(str::to_owned) else {
        debug!(path = %req.path(), "Missing or malformed Authorization header");
        return Ok(req.error_response(ApiError::Unauthorized));
    };

    let claims = match verify_token(&token, &config.access_token_secret, TokenType::Access) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, path = %req.path(), "Rejected bearer token");
            return Ok(req.error_response(ApiError::Forbidden));
        }
    };

    req.extensions_mut().insert(AuthUser::from(claims.user_info));

    next.call(req).await
}
