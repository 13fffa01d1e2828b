use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Every failure a handler or middleware can answer with.
///
/// The response body is always `{"message": ..., "isError": true}`; the
/// error itself stays attached to the response so the error logger can
/// record it.
#[derive(Debug, Display)]
pub enum ApiError {
    /// Missing or malformed request fields.
    #[display(fmt = "{}", _0)]
    Validation(String),

    /// A referenced record does not exist. Answered with 400, not 404.
    #[display(fmt = "{}", _0)]
    NotFound(String),

    /// A case-insensitively unique field is already taken.
    #[display(fmt = "{}", _0)]
    Conflict(String),

    /// No usable credential was presented.
    #[display(fmt = "Unauthorized")]
    Unauthorized,

    /// The credential was presented but rejected.
    #[display(fmt = "Forbidden")]
    Forbidden,

    #[display(fmt = "{:#}", _0)]
    Internal(anyhow::Error),
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Error class name written to the error log.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::NotFound(_) => "NotFoundError",
            Self::Conflict(_) => "ConflictError",
            Self::Unauthorized | Self::Forbidden => "AuthError",
            Self::Internal(_) => "InternalError",
        }
    }

    /// Message safe to show to clients.
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "All fields are required")]
    pub message: String,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::NotFound(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            message: self.client_message(),
            is_error: true,
        })
    }
}

/// Turns body deserialisation failures into validation errors so they share
/// the JSON error shape.
pub fn json_config() -> actix_web::web::JsonConfig {
    actix_web::web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::Validation(err.to_string()).into())
}
