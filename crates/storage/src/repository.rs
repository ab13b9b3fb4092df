use async_trait::async_trait;
use certify_core::model::{
    Assessment, AssessmentId, AttemptId, Credentials, Level, LevelBlock, Question, QuestionId,
    Role, SessionId, SessionRecord, User, UserId, ValidatedQuestion,
};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("unauthorized")]
    Unauthorized,

    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Fields needed to create a competency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssessment {
    pub name: String,
    pub description: String,
}

/// A question as listed in the admin dashboard, with its placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub question: Question,
    pub level: Option<Level>,
    pub competency_id: Option<AssessmentId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Successful login: who logged in and the issued tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    pub user: User,
    pub credentials: Credentials,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the listing cannot be fetched.
    async fn list_assessments(&self) -> Result<Vec<Assessment>, StorageError>;

    /// Questions for one level, or `None` when the level has no block.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the fetch fails.
    async fn questions_for_level(&self, level: Level) -> Result<Option<LevelBlock>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the competency cannot be created.
    async fn create_assessment(&self, draft: &NewAssessment) -> Result<Assessment, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn delete_assessment(&self, id: &AssessmentId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn create_question(
        &self,
        question: &ValidatedQuestion,
    ) -> Result<QuestionRecord, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the listing cannot be fetched.
    async fn list_questions(&self) -> Result<Vec<QuestionRecord>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the listing cannot be fetched.
    async fn list_by_competency(
        &self,
        competency: &AssessmentId,
    ) -> Result<Vec<QuestionRecord>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn get_question(&self, id: &QuestionId) -> Result<Option<QuestionRecord>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn update_question(
        &self,
        id: &QuestionId,
        question: &ValidatedQuestion,
    ) -> Result<QuestionRecord, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn remove_question(&self, id: &QuestionId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Report a finished attempt; returns the id assigned by the backend.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn create_session(&self, record: &SessionRecord) -> Result<SessionId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the listing cannot be fetched.
    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, StorageError>;

    /// Sessions whose certified level is `level`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the listing cannot be fetched.
    async fn sessions_by_level(&self, level: Level) -> Result<Vec<SessionRecord>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn delete_session(&self, id: &SessionId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the listing cannot be fetched.
    async fn list_users(&self) -> Result<Vec<User>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::Conflict` for a duplicate email, or other storage errors.
    async fn create_user(&self, user: &NewUser) -> Result<User, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn delete_user(&self, id: &UserId) -> Result<(), StorageError>;
}

/// Token-issuing side of the API.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Unauthorized` for bad credentials.
    async fn login(&self, email: &str, password: &str) -> Result<LoginGrant, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the server cannot be reached.
    async fn logout(&self, credentials: &Credentials) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::Unauthorized` when the access token is rejected.
    async fn profile(&self, credentials: &Credentials) -> Result<User, StorageError>;

    /// Exchange the refresh token for a new pair.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unauthorized` when the refresh token is rejected.
    async fn refresh(&self, credentials: &Credentials) -> Result<Credentials, StorageError>;
}

/// Local persistence for the token pair between launches.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn load_credentials(&self) -> Result<Option<Credentials>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn save_credentials(&self, credentials: &Credentials) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn clear_credentials(&self) -> Result<(), StorageError>;
}

/// Local history of finished attempts.
#[async_trait]
pub trait AttemptLogRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the attempt was already logged.
    async fn append_attempt(&self, record: &SessionRecord) -> Result<(), StorageError>;

    /// Most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the log cannot be read.
    async fn list_attempts(&self, limit: u32) -> Result<Vec<SessionRecord>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the log cannot be read.
    async fn get_attempt(&self, id: AttemptId) -> Result<Option<SessionRecord>, StorageError>;
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// All repositories behind trait objects so backends can be swapped per concern.
#[derive(Clone)]
pub struct Storage {
    pub assessments: Arc<dyn AssessmentRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub users: Arc<dyn UserRepository>,
    pub auth: Arc<dyn AuthGateway>,
    pub credentials: Arc<dyn CredentialStore>,
    pub attempt_log: Arc<dyn AttemptLogRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_memory(&crate::memory::InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_memory(repo: &crate::memory::InMemoryRepository) -> Self {
        Self {
            assessments: Arc::new(repo.clone()),
            questions: Arc::new(repo.clone()),
            sessions: Arc::new(repo.clone()),
            users: Arc::new(repo.clone()),
            auth: Arc::new(repo.clone()),
            credentials: Arc::new(repo.clone()),
            attempt_log: Arc::new(repo.clone()),
        }
    }
}
