use std::sync::Arc;

use dioxus::prelude::*;
use services::{
    AppServices, AssessmentService, AttemptService, AuthSession, AuthSnapshot, DashboardService,
    QuestionService, SessionService, UserService,
};

/// Services the views need, implemented by the composition root.
pub trait UiApp: Send + Sync {
    fn auth(&self) -> AuthSession;
    fn assessments(&self) -> Arc<AssessmentService>;
    fn questions(&self) -> Arc<QuestionService>;
    fn users(&self) -> Arc<UserService>;
    fn sessions(&self) -> Arc<SessionService>;
    fn dashboard(&self) -> Arc<DashboardService>;
    fn attempts(&self) -> Arc<AttemptService>;
}

impl UiApp for AppServices {
    fn auth(&self) -> AuthSession {
        AppServices::auth(self)
    }

    fn assessments(&self) -> Arc<AssessmentService> {
        AppServices::assessments(self)
    }

    fn questions(&self) -> Arc<QuestionService> {
        AppServices::questions(self)
    }

    fn users(&self) -> Arc<UserService> {
        AppServices::users(self)
    }

    fn sessions(&self) -> Arc<SessionService> {
        AppServices::sessions(self)
    }

    fn dashboard(&self) -> Arc<DashboardService> {
        AppServices::dashboard(self)
    }

    fn attempts(&self) -> Arc<AttemptService> {
        AppServices::attempts(self)
    }
}

#[derive(Clone)]
pub struct AppContext {
    auth: AuthSession,
    assessments: Arc<AssessmentService>,
    questions: Arc<QuestionService>,
    users: Arc<UserService>,
    sessions: Arc<SessionService>,
    dashboard: Arc<DashboardService>,
    attempts: Arc<AttemptService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            auth: app.auth(),
            assessments: app.assessments(),
            questions: app.questions(),
            users: app.users(),
            sessions: app.sessions(),
            dashboard: app.dashboard(),
            attempts: app.attempts(),
        }
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

// This context is provided by the application composition root (`crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}

/// Reactive copy of the auth session for guards and the nav bar.
#[derive(Clone, Copy)]
pub struct AuthUi {
    pub snapshot: Signal<AuthSnapshot>,
    /// Path a guard bounced the user away from, consumed after login.
    pub redirect: Signal<Option<String>>,
}

impl AuthUi {
    /// Pull the latest state out of `auth`.
    pub fn sync(mut self, auth: &AuthSession) {
        self.snapshot.set(auth.snapshot());
    }

    pub fn take_redirect(mut self) -> Option<String> {
        self.redirect.write().take()
    }
}

/// Provide [`AuthUi`] and restore any saved session once.
pub fn use_auth_provider(auth: AuthSession) -> AuthUi {
    let initial = auth.snapshot();
    let ui = use_context_provider(|| AuthUi {
        snapshot: Signal::new(initial),
        redirect: Signal::new(None),
    });
    use_future(move || {
        let auth = auth.clone();
        async move {
            if let Err(err) = auth.hydrate().await {
                tracing::warn!(%err, "could not restore session");
            }
            ui.sync(&auth);
        }
    });
    ui
}
