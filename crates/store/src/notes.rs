//! Logical notes and the media-group upsert.
//!
//! Fragments of one multi-attachment message arrive as separate concurrent
//! events sharing a media group id. The save path serializes per
//! `(user_id, media_group_id)` so exactly one note row is created, and merges
//! captions with a longest-description-wins rule since fragment order is not
//! guaranteed.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
};

use arkive_common::EventKind;

use crate::Result;

#[derive(Debug, Clone)]
pub struct Note {
    pub id: i64,
    pub user_id: i64,
    pub folder_id: i64,
    pub description: String,
    pub kind: EventKind,
    pub media_group_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Persist a note, merging into an existing row of the same media group.
    /// Returns the note id (new or existing).
    async fn save(&self, note: &Note) -> Result<i64>;
    /// Notes of one folder, newest first.
    async fn list_folder(&self, user_id: i64, folder_id: i64) -> Result<Vec<Note>>;
    async fn find_last(&self, user_id: i64) -> Result<Option<Note>>;
    async fn move_note(&self, id: i64, folder_id: i64) -> Result<()>;
    async fn move_last(&self, user_id: i64, folder_id: i64) -> Result<()>;
    async fn delete(&self, id: i64) -> Result<()>;
}

type GroupKey = (i64, String);

pub struct SqliteNoteStore {
    pool: sqlx::SqlitePool,
    // Serializes the find-then-insert of one media group; see module docs.
    group_locks: Mutex<HashMap<GroupKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl SqliteNoteStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool, group_locks: Mutex::new(HashMap::new()) }
    }

    fn group_lock(&self, key: &GroupKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.group_locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    fn release_group_lock(&self, key: &GroupKey, lock: &Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.group_locks.lock().unwrap_or_else(|e| e.into_inner());
        // Map entry + our clone: nobody else is waiting, drop the entry.
        if Arc::strong_count(lock) <= 2 {
            locks.remove(key);
        }
    }

    async fn insert(&self, note: &Note) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO notes (user_id, folder_id, description, kind, media_group_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(note.user_id)
        .bind(note.folder_id)
        .bind(&note.description)
        .bind(note.kind.as_str())
        .bind(note.media_group_id.as_deref())
        .bind(note.created_at.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn upsert_grouped(&self, note: &Note, group: &str) -> Result<i64> {
        let existing: Option<(i64, String)> = sqlx::query_as(
            "SELECT id, description FROM notes WHERE user_id = ? AND media_group_id = ?",
        )
        .bind(note.user_id)
        .bind(group)
        .fetch_optional(&self.pool)
        .await?;

        match existing {
            None => self.insert(note).await,
            Some((id, stored)) => {
                if note.description.len() > stored.len() {
                    sqlx::query("UPDATE notes SET description = ? WHERE id = ?")
                        .bind(&note.description)
                        .bind(id)
                        .execute(&self.pool)
                        .await?;
                }
                Ok(id)
            },
        }
    }
}

fn row_to_note(row: (i64, i64, i64, String, String, Option<String>, i64)) -> Note {
    let (id, user_id, folder_id, description, kind, media_group_id, created_at) = row;
    Note {
        id,
        user_id,
        folder_id,
        description,
        kind: EventKind::parse(&kind),
        media_group_id,
        created_at: DateTime::from_timestamp(created_at, 0).unwrap_or(DateTime::<Utc>::MIN_UTC),
    }
}

const NOTE_COLUMNS: &str = "id, user_id, folder_id, description, kind, media_group_id, created_at";

#[async_trait]
impl NoteStore for SqliteNoteStore {
    async fn save(&self, note: &Note) -> Result<i64> {
        let Some(group) = note.media_group_id.as_deref() else {
            return self.insert(note).await;
        };

        let key = (note.user_id, group.to_owned());
        let lock = self.group_lock(&key);
        let result = {
            let _guard = lock.lock().await;
            self.upsert_grouped(note, group).await
        };
        self.release_group_lock(&key, &lock);
        result
    }

    async fn list_folder(&self, user_id: i64, folder_id: i64) -> Result<Vec<Note>> {
        let rows: Vec<(i64, i64, i64, String, String, Option<String>, i64)> = sqlx::query_as(
            &format!(
                "SELECT {NOTE_COLUMNS} FROM notes
                 WHERE user_id = ? AND folder_id = ? ORDER BY created_at DESC"
            ),
        )
        .bind(user_id)
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_note).collect())
    }

    async fn find_last(&self, user_id: i64) -> Result<Option<Note>> {
        let row: Option<(i64, i64, i64, String, String, Option<String>, i64)> = sqlx::query_as(
            &format!(
                "SELECT {NOTE_COLUMNS} FROM notes
                 WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT 1"
            ),
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(row_to_note))
    }

    async fn move_note(&self, id: i64, folder_id: i64) -> Result<()> {
        sqlx::query("UPDATE notes SET folder_id = ? WHERE id = ?")
            .bind(folder_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn move_last(&self, user_id: i64, folder_id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE notes SET folder_id = ? WHERE id = (
                 SELECT id FROM notes WHERE user_id = ?
                 ORDER BY created_at DESC, id DESC LIMIT 1
             )",
        )
        .bind(folder_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
