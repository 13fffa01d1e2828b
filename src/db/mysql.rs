use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySqlPool, types::Json};
use tracing::debug;

use super::Store;
use crate::model::{
    note::{FIRST_TICKET, NewNote, Note},
    role::Role,
    user::{NewUser, User},
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        username VARCHAR(255) NOT NULL,
        password VARCHAR(255) NOT NULL,
        roles JSON NOT NULL,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        KEY idx_users_username (username)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS notes (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        user_id BIGINT UNSIGNED NOT NULL,
        title VARCHAR(255) NOT NULL,
        text TEXT NOT NULL,
        completed BOOLEAN NOT NULL DEFAULT FALSE,
        ticket BIGINT UNSIGNED NOT NULL,
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL,
        KEY idx_notes_user (user_id),
        KEY idx_notes_title (title)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS counters (
        name VARCHAR(64) NOT NULL PRIMARY KEY,
        seq BIGINT UNSIGNED NOT NULL
    )
    "#,
];

#[derive(FromRow)]
struct UserSql {
    id: u64,
    username: String,
    password: String,
    roles: Json<Vec<Role>>,
    active: bool,
}

impl From<UserSql> for User {
    fn from(row: UserSql) -> Self {
        Self {
            id: row.id,
            username: row.username,
            password: row.password,
            roles: row.roles.0,
            active: row.active,
        }
    }
}

#[derive(FromRow)]
struct NoteSql {
    id: u64,
    user_id: u64,
    title: String,
    text: String,
    completed: bool,
    ticket: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<NoteSql> for Note {
    fn from(row: NoteSql) -> Self {
        Self {
            id: row.id,
            user: row.user_id,
            title: row.title,
            text: row.text,
            completed: row.completed,
            ticket: row.ticket,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, username, password, roles, active";
const NOTE_COLUMNS: &str = "id, user_id, title, text, completed, ticket, created_at, updated_at";

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub async fn connect(database_uri: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_uri)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Creates missing tables and seeds the ticket counter.
    async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to create schema")?;
        }

        sqlx::query("INSERT IGNORE INTO counters (name, seq) VALUES ('ticket', ?)")
            .bind(FIRST_TICKET - 1)
            .execute(&self.pool)
            .await
            .context("Failed to seed ticket counter")?;

        Ok(())
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserSql>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn find_user_by_id(&self, id: u64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserSql>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserSql>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(username) = LOWER(?) LIMIT 1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let result =
            sqlx::query("INSERT INTO users (username, password, roles, active) VALUES (?, ?, ?, TRUE)")
                .bind(&user.username)
                .bind(&user.password)
                .bind(Json(&user.roles))
                .execute(&self.pool)
                .await?;

        debug!(user_id = result.last_insert_id(), "Inserted user");

        Ok(User {
            id: result.last_insert_id(),
            username: user.username,
            password: user.password,
            roles: user.roles,
            active: true,
        })
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        sqlx::query("UPDATE users SET username = ?, password = ?, roles = ?, active = ? WHERE id = ?")
            .bind(&user.username)
            .bind(&user.password)
            .bind(Json(&user.roles))
            .bind(user.active)
            .bind(user.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_user(&self, id: u64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_notes(&self, owner: Option<u64>) -> Result<Vec<Note>> {
        let rows = match owner {
            Some(user_id) => {
                sqlx::query_as::<_, NoteSql>(&format!(
                    "SELECT {NOTE_COLUMNS} FROM notes WHERE user_id = ? ORDER BY ticket"
                ))
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, NoteSql>(&format!(
                    "SELECT {NOTE_COLUMNS} FROM notes ORDER BY ticket"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(Note::from).collect())
    }

    async fn find_note_by_id(&self, id: u64) -> Result<Option<Note>> {
        let row = sqlx::query_as::<_, NoteSql>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Note::from))
    }

    async fn find_note_by_title(&self, title: &str) -> Result<Option<Note>> {
        let row = sqlx::query_as::<_, NoteSql>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE LOWER(title) = LOWER(?) LIMIT 1"
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Note::from))
    }

    async fn insert_note(&self, note: NewNote) -> Result<Note> {
        let mut tx = self.pool.begin().await?;

        // LAST_INSERT_ID(expr) makes the bumped value readable on this connection
        sqlx::query("UPDATE counters SET seq = LAST_INSERT_ID(seq + 1) WHERE name = 'ticket'")
            .execute(&mut *tx)
            .await?;
        let ticket: u64 = sqlx::query_scalar("SELECT LAST_INSERT_ID()")
            .fetch_one(&mut *tx)
            .await?;

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO notes (user_id, title, text, completed, ticket, created_at, updated_at)
            VALUES (?, ?, ?, FALSE, ?, ?, ?)
            "#,
        )
        .bind(note.user)
        .bind(&note.title)
        .bind(&note.text)
        .bind(ticket)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Note {
            id: result.last_insert_id(),
            user: note.user,
            title: note.title,
            text: note.text,
            completed: false,
            ticket,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_note(&self, note: &Note) -> Result<()> {
        sqlx::query(
            "UPDATE notes SET user_id = ?, title = ?, text = ?, completed = ?, updated_at = ? WHERE id = ?",
        )
        .bind(note.user)
        .bind(&note.title)
        .bind(&note.text)
        .bind(note.completed)
        .bind(Utc::now())
        .bind(note.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_note(&self, id: u64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn user_has_notes(&self, user_id: u64) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notes WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
