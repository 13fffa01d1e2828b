//! Persistence: the [`Store`] trait and its MySQL and in-memory backends.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use crate::logging::EventLog;
use crate::model::{
    note::{NewNote, Note},
    user::{NewUser, User},
};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// Users and notes as the handlers see them.
///
/// Username and title lookups compare case-insensitively. Nothing here
/// enforces uniqueness or referential integrity; callers check first.
#[async_trait]
pub trait Store: Send + Sync {
    /// All users, ordered by id.
    async fn list_users(&self) -> Result<Vec<User>>;

    async fn find_user_by_id(&self, id: u64) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn insert_user(&self, user: NewUser) -> Result<User>;

    /// Replaces username, password, roles and active flag of `user.id`.
    async fn update_user(&self, user: &User) -> Result<()>;

    /// Returns false when no such user existed.
    async fn delete_user(&self, id: u64) -> Result<bool>;

    /// Notes ordered by ticket, optionally only those owned by `owner`.
    async fn list_notes(&self, owner: Option<u64>) -> Result<Vec<Note>>;

    async fn find_note_by_id(&self, id: u64) -> Result<Option<Note>>;

    async fn find_note_by_title(&self, title: &str) -> Result<Option<Note>>;

    /// Allocates the next ticket and stamps both timestamps.
    async fn insert_note(&self, note: NewNote) -> Result<Note>;

    /// Replaces owner, title, text and completed of `note.id`, refreshing
    /// `updated_at`.
    async fn update_note(&self, note: &Note) -> Result<()>;

    async fn delete_note(&self, id: u64) -> Result<bool>;

    async fn user_has_notes(&self, user_id: u64) -> Result<bool>;

    /// Releases connections. Called once after the server stops.
    async fn close(&self) {}
}

/// Opens the store named by `database_uri`. A failed connection is also
/// written to the error event log.
pub async fn init_store(database_uri: &str, events: &EventLog) -> Result<Arc<dyn Store>> {
    if database_uri.starts_with("memory:") {
        info!("Using in-memory store");
        return Ok(Arc::new(MemoryStore::default()));
    }

    match MySqlStore::connect(database_uri).await {
        Ok(store) => {
            info!("Connected to MySQL");
            Ok(Arc::new(store))
        }
        Err(err) => {
            events.error(&format!("DatabaseError: {err:#}"));
            error!(error = ?err, "Database connection failed");
            Err(err)
        }
    }
}
