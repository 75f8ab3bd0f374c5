//! Attachment fragments, one table per payload kind.
//!
//! Each kind (photo, document, video, audio, animation, voice) keeps its own
//! table with the same shape; one store implementation is instantiated per
//! table so the kinds stay independent at the composition level.

use async_trait::async_trait;

use crate::Result;

#[derive(Debug, Clone)]
pub struct Fragment {
    pub note_id: i64,
    pub file_id: String,
    pub media_group_id: Option<String>,
}

#[async_trait]
pub trait FragmentStore: Send + Sync {
    async fn save(&self, fragment: &Fragment) -> Result<i64>;
    /// File ids to render for a note: every fragment sharing the note's media
    /// group, or the single stored file id when there is none.
    async fn find_by_note_id(&self, note_id: i64) -> Result<Vec<String>>;
    async fn update_by_note_id(&self, note_id: i64, file_id: &str) -> Result<()>;
}

pub struct SqliteFragmentStore {
    pool: sqlx::SqlitePool,
    table: &'static str,
}

impl SqliteFragmentStore {
    fn new(pool: sqlx::SqlitePool, table: &'static str) -> Self {
        Self { pool, table }
    }

    pub fn photos(pool: sqlx::SqlitePool) -> Self {
        Self::new(pool, "photos")
    }

    pub fn documents(pool: sqlx::SqlitePool) -> Self {
        Self::new(pool, "documents")
    }

    pub fn videos(pool: sqlx::SqlitePool) -> Self {
        Self::new(pool, "videos")
    }

    pub fn audios(pool: sqlx::SqlitePool) -> Self {
        Self::new(pool, "audios")
    }

    pub fn animations(pool: sqlx::SqlitePool) -> Self {
        Self::new(pool, "animations")
    }

    pub fn voices(pool: sqlx::SqlitePool) -> Self {
        Self::new(pool, "voices")
    }
}

#[async_trait]
impl FragmentStore for SqliteFragmentStore {
    async fn save(&self, fragment: &Fragment) -> Result<i64> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (note_id, file_id, media_group_id) VALUES (?, ?, ?)",
            self.table
        ))
        .bind(fragment.note_id)
        .bind(&fragment.file_id)
        .bind(fragment.media_group_id.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn find_by_note_id(&self, note_id: i64) -> Result<Vec<String>> {
        let row: Option<(String, Option<String>)> = sqlx::query_as(&format!(
            "SELECT file_id, media_group_id FROM {} WHERE note_id = ? ORDER BY id LIMIT 1",
            self.table
        ))
        .bind(note_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(Vec::new()),
            Some((file_id, None)) => Ok(vec![file_id]),
            Some((_, Some(group))) => {
                let rows: Vec<(String,)> = sqlx::query_as(&format!(
                    "SELECT file_id FROM {} WHERE media_group_id = ? ORDER BY id",
                    self.table
                ))
                .bind(&group)
                .fetch_all(&self.pool)
                .await?;
                Ok(rows.into_iter().map(|(id,)| id).collect())
            },
        }
    }

    async fn update_by_note_id(&self, note_id: i64, file_id: &str) -> Result<()> {
        sqlx::query(&format!("UPDATE {} SET file_id = ? WHERE note_id = ?", self.table))
            .bind(file_id)
            .bind(note_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn pool() -> sqlx::SqlitePool {
        let pool = sqlx::SqlitePool::connect(":memory:").await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn single_fragment_round_trip() {
        let store = SqliteFragmentStore::documents(pool().await);
        store
            .save(&Fragment { note_id: 5, file_id: "doc1".into(), media_group_id: None })
            .await
            .unwrap();
        assert_eq!(store.find_by_note_id(5).await.unwrap(), vec!["doc1"]);
        assert!(store.find_by_note_id(6).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn media_group_fans_out_all_files() {
        let store = SqliteFragmentStore::photos(pool().await);
        for file_id in ["p1", "p2", "p3"] {
            store
                .save(&Fragment {
                    note_id: 5,
                    file_id: file_id.into(),
                    media_group_id: Some("g1".into()),
                })
                .await
                .unwrap();
        }
        assert_eq!(store.find_by_note_id(5).await.unwrap(), vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn kinds_do_not_share_tables() {
        let pool = pool().await;
        let photos = SqliteFragmentStore::photos(pool.clone());
        let voices = SqliteFragmentStore::voices(pool);
        photos
            .save(&Fragment { note_id: 1, file_id: "p".into(), media_group_id: None })
            .await
            .unwrap();
        assert!(voices.find_by_note_id(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_file_id() {
        let store = SqliteFragmentStore::videos(pool().await);
        store
            .save(&Fragment { note_id: 2, file_id: "old".into(), media_group_id: None })
            .await
            .unwrap();
        store.update_by_note_id(2, "new").await.unwrap();
        assert_eq!(store.find_by_note_id(2).await.unwrap(), vec!["new"]);
    }
}
