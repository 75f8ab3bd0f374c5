//! Small key/value store: integer flags and per-key integer lists.
//!
//! Backs the session flags, the persistent anchor message id and the
//! sent-message ledger. `drain` is the atomic read-and-clear required by the
//! ledger; it runs inside one transaction so two concurrent drains never
//! observe the same ids.

use async_trait::async_trait;

use crate::Result;

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn set_int(&self, key: &str, value: i64) -> Result<()>;
    /// Stored integer, 0 when the key is missing.
    async fn int(&self, key: &str) -> Result<i64>;
    async fn append(&self, key: &str, value: i64) -> Result<()>;
    /// Return and clear the list under `key` atomically.
    async fn drain(&self, key: &str) -> Result<Vec<i64>>;
}

pub struct SqliteKvStore {
    pool: sqlx::SqlitePool,
}

impl SqliteKvStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn set_int(&self, key: &str, value: i64) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv_int (key, value) VALUES (?, ?)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn int(&self, key: &str) -> Result<i64> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT value FROM kv_int WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map_or(0, |(value,)| value))
    }

    async fn append(&self, key: &str, value: i64) -> Result<()> {
        sqlx::query("INSERT INTO kv_list (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn drain(&self, key: &str) -> Result<Vec<i64>> {
        let mut tx = self.pool.begin().await?;
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT value FROM kv_list WHERE key = ? ORDER BY id")
                .bind(key)
                .fetch_all(&mut *tx)
                .await?;
        sqlx::query("DELETE FROM kv_list WHERE key = ?")
            .bind(key)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(rows.into_iter().map(|(value,)| value).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn store() -> SqliteKvStore {
        let pool = sqlx::SqlitePool::connect(":memory:").await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        SqliteKvStore::new(pool)
    }

    #[tokio::test]
    async fn int_defaults_to_zero_and_overwrites() {
        let store = store().await;
        assert_eq!(store.int("flag:1").await.unwrap(), 0);
        store.set_int("flag:1", 1).await.unwrap();
        store.set_int("flag:1", 2).await.unwrap();
        assert_eq!(store.int("flag:1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn drain_returns_in_order_and_clears() {
        let store = store().await;
        for id in [11, 12, 13] {
            store.append("msg:1", id).await.unwrap();
        }
        store.append("msg:2", 99).await.unwrap();

        assert_eq!(store.drain("msg:1").await.unwrap(), vec![11, 12, 13]);
        assert!(store.drain("msg:1").await.unwrap().is_empty());
        // Other keys are untouched.
        assert_eq!(store.drain("msg:2").await.unwrap(), vec![99]);
    }
}
