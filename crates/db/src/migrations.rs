use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Highest migration version embedded in this build.
pub fn latest_version() -> Option<i64> {
    MIGRATOR.iter().map(|migration| migration.version).max()
}

#[cfg(test)]
mod tests {
    use super::{latest_version, run_pending};
    use crate::connect_with_settings;

    const MANAGED_SCHEMA_OBJECTS: &[&str] =
        &["invocation_log", "idx_invocation_log_agent", "idx_invocation_log_recorded_at"];

    #[tokio::test]
    async fn migrations_create_invocation_log_schema() {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");

        run_pending(&pool).await.expect("migrations should apply");

        for name in MANAGED_SCHEMA_OBJECTS {
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE name = ?")
                    .bind(*name)
                    .fetch_one(&pool)
                    .await
                    .expect("schema lookup");
            assert_eq!(count, 1, "expected schema object `{name}` after migration");
        }

        pool.close().await;
    }

    #[test]
    fn latest_version_matches_embedded_migrations() {
        assert_eq!(latest_version(), Some(1));
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");

        run_pending(&pool).await.expect("first run");
        run_pending(&pool).await.expect("second run is a no-op");

        pool.close().await;
    }
}
