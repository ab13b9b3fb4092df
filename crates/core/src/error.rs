use thiserror::Error;

use crate::attempt::AttemptError;
use crate::model::{QuestionError, SessionRecordError};
use crate::step::StepError;

/// Umbrella over the domain errors, for callers that do not match on them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Step(#[from] StepError),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    SessionRecord(#[from] SessionRecordError),
}
