use certify_core::model::{
    AnswerOption, Assessment, AssessmentId, AttemptId, CertifiedLevel, Level, OptionId,
    PriorResult, Question, QuestionId, Role, SessionRecord, SessionRecordDraft,
};
use certify_core::scoring::Score;
use certify_core::time::fixed_now;
use chrono::Duration;
use storage::memory::InMemoryRepository;
use storage::repository::{AttemptLogRepository, UserRepository};

use super::test_harness::{ViewKind, setup_view_harness};

fn question(id: &str, prompt: &str) -> Question {
    Question::new(
        QuestionId::new(id),
        prompt,
        vec![
            AnswerOption::new(OptionId::new(format!("{id}-a")), "Spreadsheet", true),
            AnswerOption::new(OptionId::new(format!("{id}-b")), "Printer", false),
        ],
        None,
    )
}

#[tokio::test(flavor = "current_thread")]
async fn login_view_smoke_renders_form() {
    let mut harness = setup_view_harness(ViewKind::Login, InMemoryRepository::new(), None).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Welcome Back"), "missing heading in {html}");
    assert!(html.contains("login-email"), "missing email input in {html}");
    assert!(html.contains("Login"), "missing submit in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn register_view_opens_on_personal_details() {
    let mut harness =
        setup_view_harness(ViewKind::Register, InMemoryRepository::new(), None).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Create Your Account"), "missing heading in {html}");
    assert!(
        html.contains("Step 1 of 2 - Personal Information"),
        "missing subtitle in {html}"
    );
    assert!(html.contains("register-first-name"), "missing first name in {html}");
    assert!(html.contains("Continue"), "missing continue in {html}");
    assert!(!html.contains("register-password"), "second page leaked in {html}");
    assert!(html.contains("Sign in here"), "missing login link in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn unauthorized_view_smoke_renders_actions() {
    let mut harness =
        setup_view_harness(ViewKind::Unauthorized, InMemoryRepository::new(), None).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Unauthorized"), "missing title in {html}");
    assert!(
        html.contains("You don’t have permission to access this page."),
        "missing message in {html}"
    );
    assert!(html.contains("Go Back"), "missing back button in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn assessment_view_lists_competencies_with_prior_result() {
    let repo = InMemoryRepository::new();
    repo.insert_assessment(Assessment::new(
        AssessmentId::new("c1"),
        "Digital literacy",
        "Files, folders and the web",
    ))
    .unwrap();
    repo.insert_assessment(
        Assessment::new(AssessmentId::new("c2"), "Office tools", "Docs and sheets").with_prior(
            PriorResult {
                score: 80.0,
                certified: CertifiedLevel::Level(Level::A2),
                no_retake: false,
            },
        ),
    )
    .unwrap();

    let mut harness = setup_view_harness(ViewKind::Assessment, repo, Some(Role::User)).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Choose a competency"), "missing heading in {html}");
    assert!(html.contains("Digital literacy"), "missing card in {html}");
    assert!(html.contains("Files, folders and the web"), "missing description in {html}");
    assert!(html.contains("Last result: A2"), "missing prior result in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn assessment_view_shows_recent_attempts() {
    let repo = InMemoryRepository::new();
    repo.insert_assessment(Assessment::new(
        AssessmentId::new("c1"),
        "Digital literacy",
        "Files, folders and the web",
    ))
    .unwrap();
    let completed_at = fixed_now();
    let record = SessionRecord::new(SessionRecordDraft {
        attempt_id: AttemptId::generate(),
        assessment_id: AssessmentId::new("c1"),
        user_id: None,
        score: Score::from_percent(82.5).unwrap(),
        certified: CertifiedLevel::Level(Level::B1),
        no_retake: false,
        steps_completed: 2,
        started_at: completed_at - Duration::minutes(8),
        completed_at,
    })
    .unwrap();
    repo.append_attempt(&record).await.unwrap();

    let mut harness = setup_view_harness(ViewKind::Assessment, repo, Some(Role::User)).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Recent attempts"), "missing history heading in {html}");
    assert!(html.contains("B1"), "missing level in {html}");
    assert!(html.contains("82.50%"), "missing score in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn anonymous_assessment_redirects_to_login() {
    let mut harness =
        setup_view_harness(ViewKind::Assessment, InMemoryRepository::new(), None).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Redirected to /login"), "expected redirect in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn dashboard_view_smoke_renders_stats_and_tables() {
    let repo = InMemoryRepository::new();
    repo.insert_question(Level::A1, question("q1", "What stores rows and columns?"))
        .unwrap();

    let mut harness = setup_view_harness(ViewKind::Dashboard, repo, Some(Role::Admin)).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Dashboard"), "missing title in {html}");
    assert!(html.contains("Certified levels"), "missing chart in {html}");
    assert!(
        html.contains("What stores rows and columns?"),
        "missing question row in {html}"
    );
    assert!(html.contains("admin@example.com"), "missing user row in {html}");
    assert!(html.contains("No sessions yet."), "missing empty sessions in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn dashboard_rejects_regular_users() {
    let mut harness =
        setup_view_harness(ViewKind::Dashboard, InMemoryRepository::new(), Some(Role::User)).await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Redirected to /unauthorized"), "expected redirect in {html}");
    assert!(!html.contains("Certified levels"), "dashboard leaked in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn home_sends_staff_to_dashboard() {
    let mut harness =
        setup_view_harness(ViewKind::Home, InMemoryRepository::new(), Some(Role::Supervisor))
            .await;
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Redirected to /dashboard"), "expected redirect in {html}");
    assert_eq!(harness.services.auth().current_user().map(|u| u.role), Some(Role::Supervisor));
    assert_eq!(harness.repo.list_users().await.unwrap().len(), 1);
}
