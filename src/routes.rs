use crate::{
    api::{notes, users},
    auth::{handlers, middleware::auth_middleware},
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{
    HttpRequest, HttpResponse,
    http::header::{self, ContentType},
    middleware::from_fn,
    web,
};
use serde_json::json;

const INDEX_PAGE: &str = include_str!("../views/index.html");
const NOT_FOUND_PAGE: &str = include_str!("../views/404.html");

pub type LoginLimiter = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per peer ip limiter allowing `requests_per_min` in a burst, refilled
/// evenly over a minute. `None` for a zero rate.
pub fn build_limiter(requests_per_min: u32) -> Option<LoginLimiter> {
    if requests_per_min == 0 {
        return None;
    }
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
}

pub fn configure(cfg: &mut web::ServiceConfig, login_limiter: &LoginLimiter) {
    cfg.service(web::resource(vec!["/", "/index", "/index.html"]).route(web::get().to(index)));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("")
                    .wrap(Governor::new(login_limiter))
                    .route(web::post().to(handlers::login)),
            )
            .service(web::resource("/refresh").route(web::get().to(handlers::refresh)))
            .service(web::resource("/logout").route(web::post().to(handlers::logout))),
    );

    // Protected routes
    cfg.service(
        web::scope("/users").wrap(from_fn(auth_middleware)).service(
            web::resource("")
                .route(web::get().to(users::list_users))
                .route(web::post().to(users::create_user))
                .route(web::patch().to(users::update_user))
                .route(web::delete().to(users::delete_user)),
        ),
    );
    cfg.service(
        web::scope("/notes").wrap(from_fn(auth_middleware)).service(
            web::resource("")
                .route(web::get().to(notes::list_notes))
                .route(web::post().to(notes::create_note))
                .route(web::patch().to(notes::update_note))
                .route(web::delete().to(notes::delete_note)),
        ),
    );
}

async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(INDEX_PAGE)
}

/// True when an `Accept` header value admits `mime`, wildcards included.
fn accepts(accept: &str, mime: &str) -> bool {
    let any_subtype = mime
        .split_once('/')
        .map(|(kind, _)| format!("{kind}/*"))
        .unwrap_or_default();

    accept
        .split(',')
        .map(|part| part.split(';').next().unwrap_or_default().trim())
        .any(|m| m == mime || m == "*/*" || m == any_subtype)
}

/// Fallback for unmatched routes, shaped by what the client accepts.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    let accept = req
        .headers()
        .get(header::ACCEPT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("*/*");

    if accepts(accept, "text/html") {
        HttpResponse::NotFound()
            .content_type(ContentType::html())
            .body(NOT_FOUND_PAGE)
    } else if accepts(accept, "application/json") {
        HttpResponse::NotFound().json(json!({ "message": "404 Not Found" }))
    } else {
        HttpResponse::NotFound()
            .content_type(ContentType::plaintext())
            .body("404 Not Found")
    }
}
