#![forbid(unsafe_code)]

pub mod app_services;
pub mod assessment_service;
pub mod attempts;
pub mod auth;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod guard;
pub mod question_service;
pub mod session_service;
pub mod user_service;

pub use certify_core::Clock;

pub use app_services::AppServices;
pub use assessment_service::AssessmentService;
pub use attempts::{AttemptFlow, AttemptService, FlowEvent, StepTimer};
pub use auth::{AuthSession, AuthSnapshot, AuthStatus, Landing};
pub use cache::{CacheTag, QueryCache};
pub use config::AppConfig;
pub use dashboard::{DashboardService, DashboardStats, search_questions};
pub use error::{
    AppServicesError, AssessmentServiceError, AttemptFlowError, AuthError, ConfigError,
    DashboardError, QuestionServiceError, SessionServiceError, UserServiceError,
};
pub use guard::{Access, GuardDecision, STAFF_ROLES};
pub use question_service::QuestionService;
pub use session_service::SessionService;
pub use user_service::UserService;
