use certify_core::model::{
    AssessmentId, AttemptId, CertifiedLevel, SessionId, SessionRecord, SessionRecordDraft, UserId,
};
use certify_core::scoring::Score;
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn steps_from_i64(v: i64) -> Result<u8, StorageError> {
    u8::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid steps_completed: {v}")))
}

pub(crate) fn map_attempt_row(row: &sqlx::sqlite::SqliteRow) -> Result<SessionRecord, StorageError> {
    let attempt_id: AttemptId = row
        .try_get::<String, _>("attempt_id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let certified: CertifiedLevel = row
        .try_get::<String, _>("certified_level")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let score = Score::from_percent(row.try_get::<f64, _>("score").map_err(ser)?).map_err(ser)?;
    let steps_completed = steps_from_i64(row.try_get::<i64, _>("steps_completed").map_err(ser)?)?;
    let no_retake = row.try_get::<i64, _>("no_retake").map_err(ser)? != 0;

    let record = SessionRecord::new(SessionRecordDraft {
        attempt_id,
        assessment_id: AssessmentId::new(row.try_get::<String, _>("assessment_id").map_err(ser)?),
        user_id: row
            .try_get::<Option<String>, _>("user_id")
            .map_err(ser)?
            .map(UserId::new),
        score,
        certified,
        no_retake,
        steps_completed,
        started_at: row.try_get("started_at").map_err(ser)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    })
    .map_err(ser)?;

    let remote: Option<String> = row.try_get("remote_id").map_err(ser)?;
    Ok(match remote {
        Some(id) => record.with_remote_id(SessionId::new(id)),
        None => record,
    })
}
