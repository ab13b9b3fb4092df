//! Sample attempt history for demos and manual testing.

use certify_core::certification::{Step, certify};
use certify_core::model::{
    AssessmentId, AttemptId, SessionRecord, SessionRecordDraft, SessionRecordError,
};
use certify_core::scoring::{Score, ScoreError};
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::repository::{AttemptLogRepository, StorageError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SeedError {
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Record(#[from] SessionRecordError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Step reached and percentage for the `i`th sample, cycling through every band.
fn sample(i: u32) -> (Step, f64) {
    const SAMPLES: [(Step, f64); 6] = [
        (Step::One, 12.5),
        (Step::One, 62.5),
        (Step::Two, 40.0),
        (Step::Two, 87.5),
        (Step::Three, 55.0),
        (Step::Three, 100.0),
    ];
    SAMPLES[(i as usize) % SAMPLES.len()]
}

/// Build `count` finished attempts, one per day going back from `now`.
///
/// # Errors
///
/// Returns `SeedError` if a sample cannot be turned into a valid record.
pub fn sample_attempts(
    competency: &AssessmentId,
    count: u32,
    now: DateTime<Utc>,
) -> Result<Vec<SessionRecord>, SeedError> {
    let mut records = Vec::with_capacity(count as usize);
    for i in 0..count {
        let (step, percent) = sample(i);
        let outcome = certify(step, Score::from_percent(percent)?);
        let completed_at = now - Duration::days(i64::from(i));
        records.push(SessionRecord::new(SessionRecordDraft {
            attempt_id: AttemptId::generate(),
            assessment_id: competency.clone(),
            user_id: None,
            score: outcome.score,
            certified: outcome.certified,
            no_retake: outcome.no_retake,
            steps_completed: step.number(),
            started_at: completed_at - Duration::minutes(i64::from(step.number()) * 4),
            completed_at,
        })?);
    }
    Ok(records)
}

/// Append sample attempts to `log`; returns how many were written.
///
/// # Errors
///
/// Returns `SeedError` if a record cannot be built or stored.
pub async fn seed_attempt_history(
    log: &dyn AttemptLogRepository,
    competency: &AssessmentId,
    count: u32,
    now: DateTime<Utc>,
) -> Result<u32, SeedError> {
    let mut written = 0;
    for record in sample_attempts(competency, count, now)? {
        match log.append_attempt(&record).await {
            Ok(()) => written += 1,
            Err(StorageError::Conflict) => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRepository;
    use certify_core::model::CertifiedLevel;
    use certify_core::time::fixed_now;

    #[test]
    fn samples_cover_fail_and_top_band() {
        let records = sample_attempts(&AssessmentId::new("c1"), 6, fixed_now()).unwrap();
        assert_eq!(records.len(), 6);
        assert_eq!(records[0].certified(), CertifiedLevel::Fail);
        assert!(records[0].no_retake());
        assert_eq!(records[5].certified().as_str(), "C2");
        assert!(records.iter().all(|r| r.started_at() < r.completed_at()));
    }

    #[tokio::test]
    async fn seeding_writes_every_sample() {
        let repo = InMemoryRepository::new();
        let written = seed_attempt_history(&repo, &AssessmentId::new("c1"), 4, fixed_now())
            .await
            .unwrap();
        assert_eq!(written, 4);
        assert_eq!(repo.list_attempts(10).await.unwrap().len(), 4);
    }
}
