use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::Store;
use crate::model::{
    note::{FIRST_TICKET, NewNote, Note},
    user::{NewUser, User},
};

/// Process-local store. Data lives as long as the process.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<u64, User>,
    notes: BTreeMap<u64, Note>,
    last_user_id: u64,
    last_note_id: u64,
    tickets_issued: u64,
}

#[inline]
fn same_text(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl MemoryStore {
    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.read()?.users.values().cloned().collect())
    }

    async fn find_user_by_id(&self, id: u64) -> Result<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| same_text(&u.username, username))
            .cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.write()?;
        tables.last_user_id += 1;

        let user = User {
            id: tables.last_user_id,
            username: user.username,
            password: user.password,
            roles: user.roles,
            active: true,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut tables = self.write()?;
        match tables.users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(anyhow!("user {} vanished before update", user.id)),
        }
    }

    async fn delete_user(&self, id: u64) -> Result<bool> {
        Ok(self.write()?.users.remove(&id).is_some())
    }

    async fn list_notes(&self, owner: Option<u64>) -> Result<Vec<Note>> {
        let tables = self.read()?;
        let mut notes: Vec<Note> = tables
            .notes
            .values()
            .filter(|n| owner.is_none_or(|id| n.user == id))
            .cloned()
            .collect();
        notes.sort_by_key(|n| n.ticket);
        Ok(notes)
    }

    async fn find_note_by_id(&self, id: u64) -> Result<Option<Note>> {
        Ok(self.read()?.notes.get(&id).cloned())
    }

    async fn find_note_by_title(&self, title: &str) -> Result<Option<Note>> {
        Ok(self
            .read()?
            .notes
            .values()
            .find(|n| same_text(&n.title, title))
            .cloned())
    }

    async fn insert_note(&self, note: NewNote) -> Result<Note> {
        let mut tables = self.write()?;
        tables.last_note_id += 1;
        let ticket = FIRST_TICKET + tables.tickets_issued;
        tables.tickets_issued += 1;

        let now = Utc::now();
        let note = Note {
            id: tables.last_note_id,
            user: note.user,
            title: note.title,
            text: note.text,
            completed: false,
            ticket,
            created_at: now,
            updated_at: now,
        };
        tables.notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn update_note(&self, note: &Note) -> Result<()> {
        let mut tables = self.write()?;
        let stored = tables
            .notes
            .get_mut(&note.id)
            .ok_or_else(|| anyhow!("note {} vanished before update", note.id))?;

        stored.user = note.user;
        stored.title = note.title.clone();
        stored.text = note.text.clone();
        stored.completed = note.completed;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_note(&self, id: u64) -> Result<bool> {
        Ok(self.write()?.notes.remove(&id).is_some())
    }

    async fn user_has_notes(&self, user_id: u64) -> Result<bool> {
        Ok(self.read()?.notes.values().any(|n| n.user == user_id))
    }
}
