//! Shared fixtures for handler tests: an in-memory store and a test config.

use crate::{
    app::AppState,
    auth::{jwt::generate_access_token, password::hash_password},
    config::Config,
    db::{MemoryStore, Store},
    logging::EventLog,
    model::{
        role::Role,
        user::{NewUser, User},
    },
    models::UserInfo,
};
use actix_web::{body::MessageBody, dev::ServiceResponse, http::header, test};
use std::{path::PathBuf, sync::Arc};

pub struct TestContext {
    pub config: Config,
    pub store: Arc<MemoryStore>,
}

impl TestContext {
    pub fn new() -> Self {
        let config = Config {
            port: 0,
            database_uri: "memory://".into(),
            access_token_secret: "test-access-secret".into(),
            refresh_token_secret: "test-refresh-secret".into(),
            access_token_ttl: 900,
            refresh_token_ttl: 604800,
            rate_login_per_min: 1000,
            allowed_origins: vec!["http://localhost:3000".into()],
            log_dir: PathBuf::from("logs"),
        };

        Self {
            config,
            store: Arc::new(MemoryStore::default()),
        }
    }

    pub fn state(&self) -> AppState {
        self.state_with_events(EventLog::disabled())
    }

    pub fn state_with_events(&self, events: EventLog) -> AppState {
        let store: Arc<dyn Store> = self.store.clone();
        AppState::new(self.config.clone(), store, events).unwrap()
    }

    pub async fn seed_user(&self, username: &str, password: &str, roles: Vec<Role>) -> User {
        self.store
            .insert_user(NewUser {
                username: username.to_string(),
                password: hash_password(password).unwrap(),
                roles,
            })
            .await
            .unwrap()
    }

    /// A valid access token for `user`.
    pub fn bearer(&self, user: &User) -> String {
        let info = UserInfo {
            user_id: user.id,
            username: user.username.clone(),
            roles: user.roles.clone(),
        };
        generate_access_token(info, &self.config.access_token_secret, self.config.access_token_ttl)
            .unwrap()
    }

    pub fn auth_header(&self, user: &User) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", self.bearer(user)))
    }
}

pub async fn body_json<B: MessageBody>(resp: ServiceResponse<B>) -> serde_json::Value {
    test::read_body_json(resp).await
}
