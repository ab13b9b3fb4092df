//! Shared error types for the services crate.

use thiserror::Error;

use certify_core::attempt::ParseRetakePolicyError;
use certify_core::forms::FormErrors;
use certify_core::model::{QuestionError, SessionRecordError};
use certify_core::step::ParseEmptyStepPolicyError;
use certify_core::{AttemptError, StepError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while reading `AppConfig`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid API url {raw}: {reason}")]
    InvalidApiUrl { raw: String, reason: String },
    #[error("database url must not be empty")]
    EmptyDbUrl,
    #[error(transparent)]
    RetakePolicy(#[from] ParseRetakePolicyError),
    #[error(transparent)]
    EmptyStep(#[from] ParseEmptyStepPolicyError),
}

/// Errors emitted by `AuthSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("login form is invalid")]
    InvalidForm(FormErrors),
    #[error("not signed in")]
    NotAuthenticated,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AssessmentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssessmentServiceError {
    #[error("competency name must not be empty")]
    EmptyName,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuestionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionServiceError {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `UserService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserServiceError {
    #[error("user form is invalid")]
    InvalidForm(FormErrors),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SessionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionServiceError {
    #[error(transparent)]
    Record(#[from] SessionRecordError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while loading dashboard statistics.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DashboardError {
    #[error("failed to load sessions: {0}")]
    Sessions(#[from] SessionServiceError),
    #[error("failed to load questions: {0}")]
    Questions(#[from] QuestionServiceError),
    #[error("failed to load users: {0}")]
    Users(#[from] UserServiceError),
}

/// Errors emitted while driving an attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptFlowError {
    #[error("attempt has ended")]
    Ended,
    #[error(transparent)]
    Step(#[from] StepError),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Record(#[from] SessionRecordError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
