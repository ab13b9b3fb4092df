use std::sync::Arc;

use storage::repository::Storage;
use tokio::runtime::Handle;

use crate::Clock;
use crate::assessment_service::AssessmentService;
use crate::attempts::AttemptService;
use crate::auth::AuthSession;
use crate::cache::QueryCache;
use crate::config::AppConfig;
use crate::dashboard::DashboardService;
use crate::error::AppServicesError;
use crate::question_service::QuestionService;
use crate::session_service::SessionService;
use crate::user_service::UserService;

/// Every app-facing service, sharing one query cache.
#[derive(Clone)]
pub struct AppServices {
    config: Arc<AppConfig>,
    auth: AuthSession,
    assessments: Arc<AssessmentService>,
    questions: Arc<QuestionService>,
    users: Arc<UserService>,
    sessions: Arc<SessionService>,
    dashboard: Arc<DashboardService>,
    attempts: Arc<AttemptService>,
}

impl AppServices {
    /// Build services backed by the REST API and the local `SQLite` file.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` for an invalid config or if storage
    /// initialization fails.
    pub async fn from_config(config: &AppConfig, clock: Clock) -> Result<Self, AppServicesError> {
        config.validate()?;
        let storage = Storage::remote(&config.api_url, &config.db_url).await?;
        Ok(Self::from_storage(storage, config.clone(), clock))
    }

    /// Wire services over an existing storage aggregate.
    ///
    /// Countdowns run on the runtime current at construction, if any.
    #[must_use]
    pub fn from_storage(storage: Storage, config: AppConfig, clock: Clock) -> Self {
        let cache = QueryCache::new();
        let auth = AuthSession::new(Arc::clone(&storage.auth), Arc::clone(&storage.credentials));
        let assessments = AssessmentService::new(Arc::clone(&storage.assessments), cache.clone());
        let questions = QuestionService::new(Arc::clone(&storage.questions), cache.clone());
        let users = UserService::new(Arc::clone(&storage.users), cache.clone());
        let sessions = SessionService::new(Arc::clone(&storage.sessions), cache);
        let dashboard = DashboardService::new(sessions.clone(), questions.clone(), users.clone());

        let mut attempts = AttemptService::new(
            clock,
            assessments.clone(),
            sessions.clone(),
            Arc::clone(&storage.attempt_log),
        )
        .with_policies(config.retake_policy, config.empty_step);
        if let Ok(runtime) = Handle::try_current() {
            attempts = attempts.with_runtime(runtime);
        }

        Self {
            config: Arc::new(config),
            auth,
            assessments: Arc::new(assessments),
            questions: Arc::new(questions),
            users: Arc::new(users),
            sessions: Arc::new(sessions),
            dashboard: Arc::new(dashboard),
            attempts: Arc::new(attempts),
        }
    }

    /// Same as [`AppServices::from_storage`], with countdowns spawned on
    /// `runtime`.
    #[must_use]
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        let attempts = (*self.attempts).clone().with_runtime(runtime);
        self.attempts = Arc::new(attempts);
        self
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn auth(&self) -> AuthSession {
        self.auth.clone()
    }

    #[must_use]
    pub fn assessments(&self) -> Arc<AssessmentService> {
        Arc::clone(&self.assessments)
    }

    #[must_use]
    pub fn questions(&self) -> Arc<QuestionService> {
        Arc::clone(&self.questions)
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.users)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<SessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn attempts(&self) -> Arc<AttemptService> {
        Arc::clone(&self.attempts)
    }
}
