use async_trait::async_trait;
use certify_core::model::{
    AnswerOption, Assessment, AssessmentId, AttemptId, Credentials, Level, LevelBlock, OptionId,
    Question, QuestionId, SessionId, SessionRecord, User, UserId, ValidatedQuestion,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::repository::{
    AssessmentRepository, AttemptLogRepository, AuthGateway, CredentialStore, LoginGrant,
    NewAssessment, NewUser, QuestionRecord, QuestionRepository, SessionRepository, StorageError,
    UserRepository,
};

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
}

#[derive(Debug, Default)]
struct Tokens {
    access: HashMap<String, UserId>,
    refresh: HashMap<String, UserId>,
}

/// Simple in-memory backend for every repository, used in tests and offline runs.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    next_id: Arc<AtomicU64>,
    assessments: Arc<Mutex<Vec<Assessment>>>,
    questions: Arc<Mutex<Vec<QuestionRecord>>>,
    sessions: Arc<Mutex<Vec<SessionRecord>>>,
    accounts: Arc<Mutex<Vec<Account>>>,
    tokens: Arc<Mutex<Tokens>>,
    credentials: Arc<Mutex<Option<Credentials>>>,
    attempts: Arc<Mutex<Vec<SessionRecord>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{n}")
    }

    /// Register an account directly, bypassing the admin flow.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the email is taken.
    pub fn insert_account(&self, account: &NewUser) -> Result<User, StorageError> {
        let mut accounts = lock(&self.accounts)?;
        if accounts
            .iter()
            .any(|a| a.user.email.eq_ignore_ascii_case(&account.email))
        {
            return Err(StorageError::Conflict);
        }
        let user = User {
            id: UserId::new(self.next("user")),
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role.clone(),
        };
        accounts.push(Account {
            user: user.clone(),
            password: account.password.clone(),
        });
        Ok(user)
    }

    /// Place a fetched-style question under `level` without validation.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store is poisoned.
    pub fn insert_question(&self, level: Level, question: Question) -> Result<(), StorageError> {
        lock(&self.questions)?.push(QuestionRecord {
            question,
            level: Some(level),
            competency_id: None,
        });
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store is poisoned.
    pub fn insert_assessment(&self, assessment: Assessment) -> Result<(), StorageError> {
        lock(&self.assessments)?.push(assessment);
        Ok(())
    }

    fn build_question(&self, id: QuestionId, draft: &ValidatedQuestion) -> QuestionRecord {
        let options = draft
            .options
            .iter()
            .enumerate()
            .map(|(index, option)| {
                AnswerOption::new(
                    OptionId::new(format!("{}-o{}", id.as_str(), index + 1)),
                    option.text.clone(),
                    option.is_correct,
                )
            })
            .collect();
        QuestionRecord {
            question: Question::new(
                id,
                draft.prompt.clone(),
                options,
                Some(draft.time_limit_secs),
            ),
            level: Some(draft.level),
            competency_id: draft.competency_id.clone(),
        }
    }

    fn issue_tokens(&self, user: &UserId) -> Result<Credentials, StorageError> {
        let credentials = Credentials::new(self.next("access"), self.next("refresh"));
        let mut tokens = lock(&self.tokens)?;
        tokens
            .access
            .insert(credentials.access_token().to_string(), user.clone());
        tokens
            .refresh
            .insert(credentials.refresh_token().to_string(), user.clone());
        Ok(credentials)
    }

    /// Drop every issued access token, as if they had all expired.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store is poisoned.
    pub fn expire_access_tokens(&self) -> Result<(), StorageError> {
        lock(&self.tokens)?.access.clear();
        Ok(())
    }
}

#[async_trait]
impl AssessmentRepository for InMemoryRepository {
    async fn list_assessments(&self) -> Result<Vec<Assessment>, StorageError> {
        Ok(lock(&self.assessments)?.clone())
    }

    async fn questions_for_level(&self, level: Level) -> Result<Option<LevelBlock>, StorageError> {
        let questions: Vec<Question> = lock(&self.questions)?
            .iter()
            .filter(|record| record.level == Some(level))
            .map(|record| record.question.clone())
            .collect();
        if questions.is_empty() {
            return Ok(None);
        }
        Ok(Some(LevelBlock::new(level, questions)))
    }

    async fn create_assessment(&self, draft: &NewAssessment) -> Result<Assessment, StorageError> {
        let assessment = Assessment::new(
            AssessmentId::new(self.next("competency")),
            draft.name.clone(),
            draft.description.clone(),
        );
        lock(&self.assessments)?.push(assessment.clone());
        Ok(assessment)
    }

    async fn delete_assessment(&self, id: &AssessmentId) -> Result<(), StorageError> {
        let mut guard = lock(&self.assessments)?;
        let before = guard.len();
        guard.retain(|a| a.id() != id);
        if guard.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn create_question(
        &self,
        question: &ValidatedQuestion,
    ) -> Result<QuestionRecord, StorageError> {
        let record = self.build_question(QuestionId::new(self.next("question")), question);
        lock(&self.questions)?.push(record.clone());
        Ok(record)
    }

    async fn list_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        Ok(lock(&self.questions)?.clone())
    }

    async fn list_by_competency(
        &self,
        competency: &AssessmentId,
    ) -> Result<Vec<QuestionRecord>, StorageError> {
        Ok(lock(&self.questions)?
            .iter()
            .filter(|record| record.competency_id.as_ref() == Some(competency))
            .cloned()
            .collect())
    }

    async fn get_question(&self, id: &QuestionId) -> Result<Option<QuestionRecord>, StorageError> {
        Ok(lock(&self.questions)?
            .iter()
            .find(|record| record.question.id() == id)
            .cloned())
    }

    async fn update_question(
        &self,
        id: &QuestionId,
        question: &ValidatedQuestion,
    ) -> Result<QuestionRecord, StorageError> {
        let updated = self.build_question(id.clone(), question);
        let mut guard = lock(&self.questions)?;
        let slot = guard
            .iter_mut()
            .find(|record| record.question.id() == id)
            .ok_or(StorageError::NotFound)?;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn remove_question(&self, id: &QuestionId) -> Result<(), StorageError> {
        let mut guard = lock(&self.questions)?;
        let before = guard.len();
        guard.retain(|record| record.question.id() != id);
        if guard.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn create_session(&self, record: &SessionRecord) -> Result<SessionId, StorageError> {
        let id = SessionId::new(self.next("session"));
        lock(&self.sessions)?.push(record.clone().with_remote_id(id.clone()));
        Ok(id)
    }

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, StorageError> {
        Ok(lock(&self.sessions)?.clone())
    }

    async fn sessions_by_level(&self, level: Level) -> Result<Vec<SessionRecord>, StorageError> {
        Ok(lock(&self.sessions)?
            .iter()
            .filter(|record| record.certified().level() == Some(level))
            .cloned()
            .collect())
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), StorageError> {
        let mut guard = lock(&self.sessions)?;
        let before = guard.len();
        guard.retain(|record| record.remote_id() != Some(id));
        if guard.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        Ok(lock(&self.accounts)?
            .iter()
            .map(|account| account.user.clone())
            .collect())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, StorageError> {
        self.insert_account(user)
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), StorageError> {
        let mut guard = lock(&self.accounts)?;
        let before = guard.len();
        guard.retain(|account| &account.user.id != id);
        if guard.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl AuthGateway for InMemoryRepository {
    async fn login(&self, email: &str, password: &str) -> Result<LoginGrant, StorageError> {
        let user = lock(&self.accounts)?
            .iter()
            .find(|a| a.user.email.eq_ignore_ascii_case(email.trim()) && a.password == password)
            .map(|a| a.user.clone())
            .ok_or(StorageError::Unauthorized)?;
        let credentials = self.issue_tokens(&user.id)?;
        Ok(LoginGrant { user, credentials })
    }

    async fn logout(&self, credentials: &Credentials) -> Result<(), StorageError> {
        let mut tokens = lock(&self.tokens)?;
        tokens.access.remove(credentials.access_token());
        tokens.refresh.remove(credentials.refresh_token());
        Ok(())
    }

    async fn profile(&self, credentials: &Credentials) -> Result<User, StorageError> {
        let user_id = lock(&self.tokens)?
            .access
            .get(credentials.access_token())
            .cloned()
            .ok_or(StorageError::Unauthorized)?;
        lock(&self.accounts)?
            .iter()
            .find(|a| a.user.id == user_id)
            .map(|a| a.user.clone())
            .ok_or(StorageError::Unauthorized)
    }

    async fn refresh(&self, credentials: &Credentials) -> Result<Credentials, StorageError> {
        let user_id = lock(&self.tokens)?
            .refresh
            .remove(credentials.refresh_token())
            .ok_or(StorageError::Unauthorized)?;
        self.issue_tokens(&user_id)
    }
}

#[async_trait]
impl CredentialStore for InMemoryRepository {
    async fn load_credentials(&self) -> Result<Option<Credentials>, StorageError> {
        Ok(lock(&self.credentials)?.clone())
    }

    async fn save_credentials(&self, credentials: &Credentials) -> Result<(), StorageError> {
        *lock(&self.credentials)? = Some(credentials.clone());
        Ok(())
    }

    async fn clear_credentials(&self) -> Result<(), StorageError> {
        *lock(&self.credentials)? = None;
        Ok(())
    }
}

#[async_trait]
impl AttemptLogRepository for InMemoryRepository {
    async fn append_attempt(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let mut guard = lock(&self.attempts)?;
        if guard.iter().any(|r| r.attempt_id() == record.attempt_id()) {
            return Err(StorageError::Conflict);
        }
        guard.push(record.clone());
        Ok(())
    }

    async fn list_attempts(&self, limit: u32) -> Result<Vec<SessionRecord>, StorageError> {
        let mut records = lock(&self.attempts)?.clone();
        records.sort_by(|a, b| b.completed_at().cmp(&a.completed_at()));
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<Option<SessionRecord>, StorageError> {
        Ok(lock(&self.attempts)?
            .iter()
            .find(|r| r.attempt_id() == id)
            .cloned())
    }
}
