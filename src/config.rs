use anyhow::{Context, Result, anyhow};
use std::{env, path::PathBuf};

/// Origins allowed to call the API from a browser, with credentials.
pub const ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://127.0.0.1:3000",
];

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// `mysql://...` or `memory://`.
    pub database_uri: String,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Login attempts per peer ip
    pub rate_login_per_min: u32,

    pub allowed_origins: Vec<String>,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Only `PORT`, `DATABASE_URI`,
    /// `ACCESS_TOKEN_SECRET` and `REFRESH_TOKEN_SECRET` are read.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("{key} must be set"))
        };

        let port = match lookup("PORT") {
            Some(p) => p.parse().with_context(|| format!("invalid PORT: {p}"))?,
            None => 3500,
        };

        Ok(Self {
            port,
            database_uri: required("DATABASE_URI")?,
            access_token_secret: required("ACCESS_TOKEN_SECRET")?,
            refresh_token_secret: required("REFRESH_TOKEN_SECRET")?,
            access_token_ttl: 900,     // 15 min
            refresh_token_ttl: 604800, // 7 days
            rate_login_per_min: 5,
            allowed_origins: ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
            log_dir: PathBuf::from("logs"),
        })
    }

    pub fn server_addr(&self) -> (&'static str, u16) {
        ("0.0.0.0", self.port)
    }
}
