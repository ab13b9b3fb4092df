mod assessment;
mod ids;
mod level;
mod question;
mod session;
mod user;

pub use assessment::{Assessment, LevelBlock, PriorResult};
pub use ids::{AssessmentId, AttemptId, OptionId, ParseIdError, QuestionId, SessionId, UserId};
pub use level::{CertifiedLevel, Level, ParseLevelError};
pub use question::{
    AnswerOption, DEFAULT_TIME_LIMIT_SECS, OptionDraft, Question, QuestionDraft, QuestionError,
    QuestionIssue, ValidatedQuestion,
};
pub use session::{SessionRecord, SessionRecordDraft, SessionRecordError};
pub use user::{Credentials, Role, User};
