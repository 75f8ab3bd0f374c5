//! Per-user folders.
//!
//! A folder name is unique per user (upsert on conflict). The distinguished
//! folder named [`arkive_common::buttons::DEFAULT_FOLDER_NAME`] is created on
//! first contact and is never deleted.

use async_trait::async_trait;

use arkive_common::buttons::DEFAULT_FOLDER_NAME;

use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

#[async_trait]
pub trait FolderStore: Send + Sync {
    /// Upsert a folder by `(user_id, name)` and return its id.
    async fn save(&self, user_id: i64, name: &str) -> Result<i64>;
    async fn find_or_create(&self, user_id: i64, name: &str) -> Result<i64>;
    async fn find(&self, id: i64) -> Result<Option<String>>;
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Folder>>;
    async fn delete(&self, id: i64) -> Result<()>;
    /// Id of the user's default folder, `None` before first bootstrap.
    async fn default_folder_id(&self, user_id: i64) -> Result<Option<i64>>;
}

pub struct SqliteFolderStore {
    pool: sqlx::SqlitePool,
}

impl SqliteFolderStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderStore for SqliteFolderStore {
    async fn save(&self, user_id: i64, name: &str) -> Result<i64> {
        sqlx::query(
            "INSERT INTO folders (user_id, name) VALUES (?, ?)
             ON CONFLICT (user_id, name) DO NOTHING",
        )
        .bind(user_id)
        .bind(name)
        .execute(&self.pool)
        .await?;
        let (id,): (i64,) = sqlx::query_as("SELECT id FROM folders WHERE user_id = ? AND name = ?")
            .bind(user_id)
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    async fn find_or_create(&self, user_id: i64, name: &str) -> Result<i64> {
        self.save(user_id, name).await
    }

    async fn find(&self, id: i64) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT name FROM folders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(name,)| name))
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Folder>> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, name FROM folders WHERE user_id = ? ORDER BY id")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| Folder { id, user_id, name })
            .collect())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM folders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn default_folder_id(&self, user_id: i64) -> Result<Option<i64>> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM folders WHERE user_id = ? AND name = ?")
                .bind(user_id)
                .bind(DEFAULT_FOLDER_NAME)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(id,)| id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn store() -> SqliteFolderStore {
        let pool = sqlx::SqlitePool::connect(":memory:").await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        SqliteFolderStore::new(pool)
    }

    #[tokio::test]
    async fn save_upserts_by_user_and_name() {
        let store = store().await;
        let first = store.save(1, "work").await.unwrap();
        let second = store.save(1, "work").await.unwrap();
        assert_eq!(first, second);

        // Same name for another user is a distinct folder.
        let other = store.save(2, "work").await.unwrap();
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn default_folder_created_once() {
        let store = store().await;
        assert_eq!(store.default_folder_id(1).await.unwrap(), None);
        let id = store.save(1, DEFAULT_FOLDER_NAME).await.unwrap();
        let again = store.save(1, DEFAULT_FOLDER_NAME).await.unwrap();
        assert_eq!(id, again);
        assert_eq!(store.default_folder_id(1).await.unwrap(), Some(id));
    }

    #[tokio::test]
    async fn list_and_delete() {
        let store = store().await;
        let work = store.save(1, "work").await.unwrap();
        store.save(1, "home").await.unwrap();
        assert_eq!(store.list_by_user(1).await.unwrap().len(), 2);

        store.delete(work).await.unwrap();
        let rest = store.list_by_user(1).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].name, "home");
        assert_eq!(store.find(work).await.unwrap(), None);
    }
}
