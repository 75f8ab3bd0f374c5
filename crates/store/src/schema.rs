//! Migration runner for the arkive database.

use crate::Result;

/// Run database migrations.
///
/// Creates the `users`, `folders`, `notes`, per-kind fragment tables and the
/// `kv_int`/`kv_list` tables used for session flags and the message ledger.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = sqlx::SqlitePool::connect(":memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let row: (i64,) = sqlx::query_as("SELECT count(*) FROM notes")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.0, 0);
    }
}
