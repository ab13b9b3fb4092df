use std::sync::Arc;

use async_trait::async_trait;
use certify_core::model::{
    Assessment, AssessmentId, CertifiedLevel, Level, OptionDraft, QuestionDraft, SessionId,
    SessionRecord,
};
use certify_core::AttemptState;
use certify_core::time::fixed_now;
use services::{AppConfig, AppServices, Clock, FlowEvent};
use storage::memory::InMemoryRepository;
use storage::repository::{SessionRepository, Storage, StorageError};
use storage::sqlite::SqliteRepository;

async fn sqlite_log(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect sqlite");
    repo.migrate().await.expect("migrate");
    repo
}

fn draft(level: Level, prompt: &str) -> QuestionDraft {
    QuestionDraft {
        competency_id: Some(AssessmentId::new("digital")),
        level,
        prompt: prompt.into(),
        options: vec![OptionDraft::new("right", true), OptionDraft::new("wrong", false)],
        time_limit_secs: Some(5),
    }
}

/// Upstream that rejects every session write.
struct OfflineSessions;

#[async_trait]
impl SessionRepository for OfflineSessions {
    async fn create_session(&self, _record: &SessionRecord) -> Result<SessionId, StorageError> {
        Err(StorageError::Connection("api unreachable".into()))
    }

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, StorageError> {
        Err(StorageError::Connection("api unreachable".into()))
    }

    async fn sessions_by_level(&self, _level: Level) -> Result<Vec<SessionRecord>, StorageError> {
        Err(StorageError::Connection("api unreachable".into()))
    }

    async fn delete_session(&self, _id: &SessionId) -> Result<(), StorageError> {
        Err(StorageError::Connection("api unreachable".into()))
    }
}

#[tokio::test(start_paused = true)]
async fn timed_out_attempt_is_logged_locally_when_upstream_is_down() {
    let repo = InMemoryRepository::new();
    let mut storage = Storage::from_memory(&repo);
    storage.sessions = Arc::new(OfflineSessions);
    let services = AppServices::from_storage(storage, AppConfig::default(), Clock::fixed(fixed_now()));

    for prompt in ["Open a file", "Save a file"] {
        services.questions().create(draft(Level::A1, prompt)).await.unwrap();
    }

    let attempts = services.attempts();
    let assessment = Assessment::new(AssessmentId::new("digital"), "Digital skills", "");
    let (mut flow, mut ticks) = attempts.begin(&assessment);
    assert_eq!(
        attempts.load_current_step(&mut flow).await.unwrap(),
        FlowEvent::Loaded { total: 2 }
    );

    // Nobody answers; both questions expire.
    while !flow.is_terminal() {
        let generation = ticks.recv().await.expect("tick");
        flow.on_tick(generation).unwrap();
    }
    assert_eq!(flow.state(), AttemptState::Failed);

    let record = attempts
        .finish(&flow, &assessment, None)
        .unwrap()
        .expect("record");
    let logged = attempts.report(record).await;
    assert!(logged.remote_id().is_none());

    let history = attempts.history(10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].certified(), CertifiedLevel::Fail);
    assert!(history[0].no_retake());
}

#[tokio::test]
async fn answered_attempt_reaches_dashboard() {
    let repo = InMemoryRepository::new();
    let mut storage = Storage::from_memory(&repo);
    storage.attempt_log = Arc::new(sqlite_log("memdb_attempt_dashboard").await);
    let services = AppServices::from_storage(storage, AppConfig::default(), Clock::fixed(fixed_now()));

    services.questions().create(draft(Level::A1, "Copy text")).await.unwrap();
    services.questions().create(draft(Level::B1, "Use a formula")).await.unwrap();

    let attempts = services.attempts();
    let assessment = Assessment::new(AssessmentId::new("digital"), "Digital skills", "");
    let (mut flow, _ticks) = attempts.begin(&assessment);

    let mut finished = Vec::new();
    while flow.needs_questions() {
        if attempts.load_current_step(&mut flow).await.unwrap() == FlowEvent::Empty {
            break;
        }
        loop {
            let question = flow.runner().current_question().expect("question").clone();
            let right = question
                .options()
                .iter()
                .find(|option| option.is_correct())
                .expect("correct option")
                .id()
                .clone();
            flow.select(right).unwrap();
            match flow.next().unwrap() {
                FlowEvent::StepFinished { outcome, .. } => {
                    finished.push(outcome.step);
                    break;
                }
                _ => continue,
            }
        }
    }

    // Step three has no C1 questions, so the attempt waits there.
    assert_eq!(finished.len(), 2);
    assert_eq!(flow.runner().status(), certify_core::StepStatus::Empty);
    assert!(!flow.is_terminal());
    assert_eq!(flow.latest().certified, CertifiedLevel::Level(Level::B2));

    let stats = services.dashboard().stats(true).await.unwrap();
    assert_eq!(stats.total_questions, 2);
    assert_eq!(stats.total_sessions, 0);
}
