use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Applies the versioned schema for the local store.
///
/// Version 1 holds the saved token pair and the attempt log; version 2 adds
/// the remote session id to logged attempts.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    async fn mark_applied(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        version: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(version)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        // Single-row table; id is pinned to 1.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS credentials (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    access_token TEXT NOT NULL,
                    refresh_token TEXT NOT NULL,
                    saved_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS attempt_log (
                    attempt_id TEXT PRIMARY KEY,
                    assessment_id TEXT NOT NULL,
                    user_id TEXT,
                    score REAL NOT NULL CHECK (score >= 0 AND score <= 100),
                    certified_level TEXT NOT NULL,
                    no_retake INTEGER NOT NULL CHECK (no_retake IN (0, 1)),
                    steps_completed INTEGER NOT NULL CHECK (steps_completed BETWEEN 1 AND 3),
                    started_at TEXT NOT NULL,
                    completed_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_attempt_log_completed
                ON attempt_log (completed_at DESC);
            ",
        )
        .execute(&mut *tx)
        .await?;

        mark_applied(&mut tx, 1).await?;
        tx.commit().await?;
    }

    if !is_applied(pool, 2).await? {
        let mut tx = pool.begin().await?;
        sqlx::query("ALTER TABLE attempt_log ADD COLUMN remote_id TEXT;")
            .execute(&mut *tx)
            .await?;
        mark_applied(&mut tx, 2).await?;
        tx.commit().await?;
    }

    Ok(())
}
