//! `ApiClient` against a local axum stand-in for the assessment API.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use certify_core::model::{
    AssessmentId, AttemptId, CertifiedLevel, Credentials, Level, Role, SessionRecord,
    SessionRecordDraft,
};
use certify_core::scoring::Score;
use certify_core::time::fixed_now;
use storage::memory::InMemoryRepository;
use storage::repository::{
    AssessmentRepository, AuthGateway, CredentialStore, SessionRepository, StorageError,
    UserRepository,
};
use storage::rest::ApiClient;

#[derive(Default)]
struct Fake {
    refreshes: AtomicUsize,
    sessions_created: AtomicUsize,
}

type Shared = Arc<Fake>;

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["password"] == "secret1" {
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "user": { "_id": "u1", "name": "Ada", "email": body["email"], "role": "admin" },
                    "accessToken": "stale",
                    "refreshToken": "r1"
                }
            })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Invalid credentials" })),
        )
    }
}

async fn refresh(State(fake): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    fake.refreshes.fetch_add(1, Ordering::SeqCst);
    if body["refreshToken"] == "r1" {
        (
            StatusCode::OK,
            Json(json!({ "success": true, "data": { "accessToken": "fresh", "refreshToken": "r2" } })),
        )
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "success": false })))
    }
}

async fn level(headers: HeaderMap, Path(level): Path<String>) -> (StatusCode, Json<Value>) {
    if bearer(&headers) != Some("fresh") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "success": false })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": {
                "_id": "c1",
                "name": "Digital literacy",
                "questionsByLevel": [{
                    "level": level,
                    "questions": [{
                        "_id": "q1",
                        "questionText": "Which is an input device?",
                        "timeLimitSeconds": 30,
                        "options": [
                            { "_id": "o1", "text": "Keyboard", "isCorrect": true },
                            { "_id": "o2", "text": "Monitor", "isCorrect": false }
                        ]
                    }]
                }]
            }
        })),
    )
}

async fn create_session(
    State(fake): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    fake.sessions_created.fetch_add(1, Ordering::SeqCst);
    assert_eq!(body["level"], "A2");
    assert_eq!(body["competencyId"], "c1");
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": { "_id": "s1" } })),
    )
}

async fn users() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": [
            { "_id": "u1", "name": "Ada", "email": "ada@example.com", "role": "admin" },
            { "_id": "u2", "name": "Bo", "email": "bo@example.com", "role": "user" }
        ]
    }))
}

async fn delete_user(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    if id == "u2" {
        (StatusCode::OK, Json(json!({ "success": true, "data": { "deletedId": id } })))
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "success": false })))
    }
}

async fn spawn_api() -> (String, Shared) {
    let fake: Shared = Arc::default();
    let app = Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/refresh-token", post(refresh))
        .route("/api/v1/competencies/level/:level", get(level))
        .route("/api/v1/sessions/create", post(create_session))
        .route("/api/v1/users", get(users))
        .route("/api/v1/users/:id", delete(delete_user))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}/api/v1/"), fake)
}

#[tokio::test]
async fn login_then_refresh_on_unauthorized_and_persist() {
    let (base, fake) = spawn_api().await;
    let local = InMemoryRepository::new();
    let client = ApiClient::new(base)
        .unwrap()
        .with_credential_store(Arc::new(local.clone()));

    let grant = client.login("ada@example.com", "secret1").await.unwrap();
    assert_eq!(grant.user.role, Role::Admin);
    assert_eq!(client.credentials(), Some(Credentials::new("stale", "r1")));

    let block = client
        .questions_for_level(Level::B1)
        .await
        .unwrap()
        .expect("block");
    assert_eq!(block.level(), Level::B1);
    assert_eq!(block.questions()[0].time_limit(), 30);

    assert_eq!(fake.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(client.credentials(), Some(Credentials::new("fresh", "r2")));
    assert_eq!(
        local.load_credentials().await.unwrap(),
        Some(Credentials::new("fresh", "r2"))
    );
}

#[tokio::test]
async fn rejected_refresh_drops_tokens() {
    let (base, fake) = spawn_api().await;
    let local = InMemoryRepository::new();
    local
        .save_credentials(&Credentials::new("old", "revoked"))
        .await
        .unwrap();
    let client = ApiClient::new(base)
        .unwrap()
        .with_credential_store(Arc::new(local.clone()));
    client.set_credentials(Some(Credentials::new("old", "revoked")));

    let err = client.questions_for_level(Level::A1).await.unwrap_err();
    assert!(matches!(err, StorageError::Unauthorized));
    assert_eq!(fake.refreshes.load(Ordering::SeqCst), 1);
    assert!(client.credentials().is_none());
    assert!(local.load_credentials().await.unwrap().is_none());
}

#[tokio::test]
async fn bad_password_is_unauthorized() {
    let (base, _fake) = spawn_api().await;
    let client = ApiClient::new(base).unwrap();
    assert!(matches!(
        client.login("ada@example.com", "nope").await,
        Err(StorageError::Unauthorized)
    ));
}

#[tokio::test]
async fn session_create_posts_record_and_returns_id() {
    let (base, fake) = spawn_api().await;
    let client = ApiClient::new(base).unwrap();
    let record = SessionRecord::new(SessionRecordDraft {
        attempt_id: AttemptId::generate(),
        assessment_id: AssessmentId::new("c1"),
        user_id: None,
        score: Score::from_percent(62.5).unwrap(),
        certified: CertifiedLevel::Level(Level::A2),
        no_retake: false,
        steps_completed: 1,
        started_at: fixed_now(),
        completed_at: fixed_now(),
    })
    .unwrap();

    let id = client.create_session(&record).await.unwrap();
    assert_eq!(id.as_str(), "s1");
    assert_eq!(fake.sessions_created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn user_listing_and_missing_delete() {
    let (base, _fake) = spawn_api().await;
    let client = ApiClient::new(base).unwrap();

    let users = client.list_users().await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1].role, Role::User);

    client
        .delete_user(&certify_core::model::UserId::new("u2"))
        .await
        .unwrap();
    assert!(matches!(
        client
            .delete_user(&certify_core::model::UserId::new("zz"))
            .await,
        Err(StorageError::NotFound)
    ));
}
