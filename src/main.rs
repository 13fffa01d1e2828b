use actix_web::HttpServer;
use dotenvy::dotenv;

mod api;
mod app;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod logging;
mod model;
mod models;
mod routes;
#[cfg(test)]
mod test_utils;

use app::{AppState, build_app};
use config::Config;
use db::init_store;
use logging::{EventLog, init_tracing};
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    let _tracing_guard = init_tracing(&config.log_dir);
    let (events, _event_guards) = EventLog::open(&config.log_dir)?;

    info!("Server starting...");

    let store = init_store(&config.database_uri, &events).await?;
    info!("Connected to database");

    let server_addr = config.server_addr();
    let state = AppState::new(config, store.clone(), events)?;

    let server = HttpServer::new(move || build_app(state.clone())).bind(server_addr)?;
    info!(port = server_addr.1, "Server running");

    server.run().await?;

    store.close().await;
    info!("Server stopped");

    Ok(())
}
