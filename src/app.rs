use crate::{
    config::Config,
    db::Store,
    docs::ApiDoc,
    error::json_config,
    logging::{EventLog, error_logger, request_logger},
    routes::{self, LoginLimiter, build_limiter},
};
use actix_cors::Cors;
use actix_web::{
    App, Error,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    http::{Method, header},
    middleware::{NormalizePath, from_fn},
    web::{self, Data},
};
use anyhow::{Result, anyhow};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Everything a worker needs, built once at startup and cloned per worker.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub events: EventLog,
    login_limiter: LoginLimiter,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>, events: EventLog) -> Result<Self> {
        // Shared by all workers so the limit holds per process, not per worker.
        let login_limiter = build_limiter(config.rate_login_per_min)
            .ok_or_else(|| anyhow!("invalid login rate limit: {}", config.rate_login_per_min))?;

        Ok(Self {
            config,
            store,
            events,
            login_limiter,
        })
    }
}

fn cors(config: &Config) -> Cors {
    config
        .allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allowed_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .supports_credentials()
        .block_on_origin_mismatch(true)
        .max_age(3600)
}

/// The full application: data, middleware stack and routes.
///
/// Middleware runs outermost first: request logger, error logger, path
/// normalisation, CORS, then the router.
pub fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let AppState {
        config,
        store,
        events,
        login_limiter,
    } = state;

    App::new()
        .app_data(Data::new(config.clone()))
        .app_data(Data::from(store))
        .app_data(Data::new(events))
        .app_data(json_config())
        .wrap(cors(&config))
        .wrap(NormalizePath::trim())
        .wrap(from_fn(error_logger))
        .wrap(from_fn(request_logger))
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                .url("/api-doc/openapi.json", ApiDoc::openapi()),
        )
        .configure(|cfg| routes::configure(cfg, &login_limiter))
        .default_service(web::route().to(routes::not_found))
}
