//! User records.

use async_trait::async_trait;

use crate::Result;

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn save(&self, user: &User) -> Result<()>;
    async fn exists(&self, id: i64) -> Result<bool>;
    async fn count(&self) -> Result<i64>;
}

pub struct SqliteUserStore {
    pool: sqlx::SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn save(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username) VALUES (?, ?)
             ON CONFLICT (id) DO UPDATE SET username = excluded.username",
        )
        .bind(user.id)
        .bind(&user.username)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT count(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn store() -> SqliteUserStore {
        let pool = sqlx::SqlitePool::connect(":memory:").await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        SqliteUserStore::new(pool)
    }

    #[tokio::test]
    async fn save_is_idempotent() {
        let store = store().await;
        let user = User { id: 7, username: "alice".into() };
        store.save(&user).await.unwrap();
        store.save(&user).await.unwrap();
        assert!(store.exists(7).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_user_does_not_exist() {
        let store = store().await;
        assert!(!store.exists(1).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
