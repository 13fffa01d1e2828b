//! Tracing setup plus the two append-only event files.
//!
//! `reqLog.log` gets one line per request and `errLog.log` one line per
//! error response. Each line is `<yyyyMMdd>\t<HH:mm:ss>\t<uuid>\t<message>`.

use crate::error::{ApiError, ErrorBody};
use actix_cors::CorsError;
use actix_web::{
    Error, HttpResponse,
    body::{BoxBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    error::InternalError,
    http::{
        StatusCode,
        header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, ORIGIN},
    },
    middleware::Next,
    web::Data,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::io::Write;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling::{self, RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

pub const REQUEST_LOG: &str = "reqLog.log";
pub const ERROR_LOG: &str = "errLog.log";

/// Keeps the background writers alive; dropping it flushes pending lines.
pub struct LogGuards(#[allow(dead_code)] Vec<WorkerGuard>);

/// Console plus a daily rolling `app.log`.
pub fn init_tracing(log_dir: &Path) -> LogGuards {
    let file_appender = rolling::daily(log_dir, "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false), // removes module path
        )
        .with(fmt::layer().with_target(false))
        .init();

    LogGuards(vec![guard])
}

pub fn format_line(at: DateTime<Local>, id: Uuid, message: &str) -> String {
    format!("{}\t{}\t{}\n", at.format("%Y%m%d\t%H:%M:%S"), id, message)
}

#[derive(Clone, Default)]
pub struct EventLog {
    requests: Option<NonBlocking>,
    errors: Option<NonBlocking>,
}

fn open_append(dir: &Path, file: &str) -> Result<(NonBlocking, WorkerGuard)> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file)
        .build(dir)
        .with_context(|| format!("Failed to open {}", dir.join(file).display()))?;
    Ok(tracing_appender::non_blocking(appender))
}

impl EventLog {
    /// Opens (creating if needed) both files under `dir` in append mode.
    pub fn open(dir: &Path) -> Result<(Self, LogGuards)> {
        let (requests, req_guard) = open_append(dir, REQUEST_LOG)?;
        let (errors, err_guard) = open_append(dir, ERROR_LOG)?;

        Ok((
            Self {
                requests: Some(requests),
                errors: Some(errors),
            },
            LogGuards(vec![req_guard, err_guard]),
        ))
    }

    /// Drops every event.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn request(&self, message: &str) {
        Self::append(self.requests.as_ref(), message);
    }

    pub fn error(&self, message: &str) {
        Self::append(self.errors.as_ref(), message);
    }

    fn append(sink: Option<&NonBlocking>, message: &str) {
        let Some(sink) = sink else { return };
        let line = format_line(Local::now(), Uuid::new_v4(), message);
        if let Err(e) = sink.clone().write_all(line.as_bytes()) {
            warn!(error = %e, "Failed to append event log line");
        }
    }
}

fn origin_of(req: &ServiceRequest) -> String {
    req.headers()
        .get(ORIGIN)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

/// Outermost stage: records every incoming request.
pub async fn request_logger(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if let Some(events) = req.app_data::<Data<EventLog>>() {
        events.request(&format!("{}\t{}\t{}", req.method(), req.uri(), origin_of(&req)));
    }
    info!(method = %req.method(), path = %req.path(), "Request");

    next.call(req).await
}

fn error_name(err: &Error) -> &'static str {
    if let Some(api) = err.as_error::<ApiError>() {
        api.name()
    } else if err.as_error::<CorsError>().is_some() {
        "CorsError"
    } else {
        "Error"
    }
}

/// Rebuilds an error raised outside the handlers (rate limiter, CORS, ...)
/// as the JSON error body, keeping its status and extra headers.
fn json_error(err: &Error, status: StatusCode, headers: &HeaderMap) -> HttpResponse {
    let message = if status.is_server_error() {
        "Internal Server Error".to_string()
    } else {
        err.to_string()
    };

    let mut builder = HttpResponse::build(status);
    for (name, value) in headers {
        if *name != CONTENT_TYPE && *name != CONTENT_LENGTH {
            builder.append_header((name.clone(), value.clone()));
        }
    }
    builder.json(ErrorBody {
        message,
        is_error: true,
    })
}

/// Records every response that carries an error, whichever stage raised it,
/// and makes sure the client sees the JSON error shape.
pub async fn error_logger(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let origin = origin_of(&req);
    let events = req.app_data::<Data<EventLog>>().cloned();

    let log = |err: &Error| {
        let line = format!("{}: {err}\t{method}\t{uri}\t{origin}", error_name(err));
        if let Some(events) = &events {
            events.error(&line);
        }
        error!(error = ?err, %method, %uri, "{line}");
    };

    match next.call(req).await {
        Ok(res) => {
            let reshaped = match res.response().error() {
                Some(err) => {
                    log(err);
                    err.as_error::<ApiError>()
                        .is_none()
                        .then(|| json_error(err, res.status(), res.headers()))
                }
                None => None,
            };

            Ok(match reshaped {
                Some(body) => res.into_response(body),
                None => res.map_into_boxed_body(),
            })
        }
        Err(err) => {
            log(&err);
            if err.as_error::<ApiError>().is_some() {
                return Err(err);
            }
            let original = err.error_response();
            let body = json_error(&err, original.status(), original.headers());
            Err(InternalError::from_response(err.to_string(), body).into())
        }
    }
}
