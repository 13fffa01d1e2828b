use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// First ticket number handed out; later notes count up from here.
pub const FIRST_TICKET: u64 = 500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Note {
    #[schema(example = 1)]
    pub id: u64,
    /// Owning user id.
    #[schema(example = 1)]
    pub user: u64,
    #[schema(example = "Printer jam")]
    pub title: String,
    #[schema(example = "Front desk printer keeps jamming")]
    pub text: String,
    pub completed: bool,
    #[schema(example = 500)]
    pub ticket: u64,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNote {
    pub user: u64,
    pub title: String,
    pub text: String,
}

/// A note as listed to clients, with the owner's username attached.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteView {
    #[serde(flatten)]
    pub note: Note,
    #[schema(example = "Dave")]
    pub username: Option<String>,
}
