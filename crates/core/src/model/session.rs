use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{AssessmentId, AttemptId, SessionId, UserId};
use crate::model::level::CertifiedLevel;
use crate::scoring::Score;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionRecordError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("steps completed must be between 1 and 3, got {steps}")]
    InvalidStepCount { steps: u8 },
}

/// Final result of one attempt, as reported upstream and kept locally.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    attempt_id: AttemptId,
    remote_id: Option<SessionId>,
    assessment_id: AssessmentId,
    user_id: Option<UserId>,
    score: Score,
    certified: CertifiedLevel,
    no_retake: bool,
    steps_completed: u8,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

/// Input for [`SessionRecord::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecordDraft {
    pub attempt_id: AttemptId,
    pub assessment_id: AssessmentId,
    pub user_id: Option<UserId>,
    pub score: Score,
    pub certified: CertifiedLevel,
    pub no_retake: bool,
    pub steps_completed: u8,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Validate and build a record.
    ///
    /// # Errors
    ///
    /// Returns `SessionRecordError` when timestamps are inverted or the step
    /// count is outside 1..=3.
    pub fn new(draft: SessionRecordDraft) -> Result<Self, SessionRecordError> {
        if draft.completed_at < draft.started_at {
            return Err(SessionRecordError::InvalidTimeRange);
        }
        if !(1..=3).contains(&draft.steps_completed) {
            return Err(SessionRecordError::InvalidStepCount {
                steps: draft.steps_completed,
            });
        }

        Ok(Self {
            attempt_id: draft.attempt_id,
            remote_id: None,
            assessment_id: draft.assessment_id,
            user_id: draft.user_id,
            score: draft.score,
            certified: draft.certified,
            no_retake: draft.no_retake,
            steps_completed: draft.steps_completed,
            started_at: draft.started_at,
            completed_at: draft.completed_at,
        })
    }

    #[must_use]
    pub fn with_remote_id(mut self, id: SessionId) -> Self {
        self.remote_id = Some(id);
        self
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn remote_id(&self) -> Option<&SessionId> {
        self.remote_id.as_ref()
    }

    #[must_use]
    pub fn assessment_id(&self) -> &AssessmentId {
        &self.assessment_id
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    #[must_use]
    pub fn certified(&self) -> CertifiedLevel {
        self.certified
    }

    #[must_use]
    pub fn no_retake(&self) -> bool {
        self.no_retake
    }

    #[must_use]
    pub fn steps_completed(&self) -> u8 {
        self.steps_completed
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}
