use certify_core::model::{AttemptId, SessionRecord};

use super::SqliteRepository;
use super::mapping::map_attempt_row;
use crate::repository::{AttemptLogRepository, StorageError};

const SELECT_COLUMNS: &str = r"
    SELECT attempt_id, assessment_id, user_id, score, certified_level, no_retake,
           steps_completed, started_at, completed_at, remote_id
    FROM attempt_log
";

#[async_trait::async_trait]
impl AttemptLogRepository for SqliteRepository {
    async fn append_attempt(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO attempt_log (
                    attempt_id, assessment_id, user_id, score, certified_level,
                    no_retake, steps_completed, started_at, completed_at, remote_id
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(attempt_id) DO NOTHING
            ",
        )
        .bind(record.attempt_id().to_string())
        .bind(record.assessment_id().as_str())
        .bind(record.user_id().map(|id| id.as_str().to_string()))
        .bind(record.score().percent())
        .bind(record.certified().as_str())
        .bind(i64::from(record.no_retake()))
        .bind(i64::from(record.steps_completed()))
        .bind(record.started_at())
        .bind(record.completed_at())
        .bind(record.remote_id().map(|id| id.as_str().to_string()))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }
        Ok(())
    }

    async fn list_attempts(&self, limit: u32) -> Result<Vec<SessionRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} ORDER BY completed_at DESC, attempt_id ASC LIMIT ?1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_attempt_row).collect()
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<Option<SessionRecord>, StorageError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE attempt_id = ?1"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_attempt_row).transpose()
    }
}
