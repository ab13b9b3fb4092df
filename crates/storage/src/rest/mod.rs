//! HTTP adapter for the assessment API (`/api/v1`).

pub mod dto;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

use certify_core::model::{
    Assessment, AssessmentId, Credentials, Level, LevelBlock, QuestionId, SessionId,
    SessionRecord, User, UserId, ValidatedQuestion,
};

use crate::repository::{
    AssessmentRepository, AuthGateway, CredentialStore, LoginGrant, NewAssessment, NewUser,
    QuestionRecord, QuestionRepository, SessionRepository, StorageError, UserRepository,
};
use dto::{
    AssessmentDto, CreatedDto, Envelope, LoginDto, LoginRequest, NewAssessmentPayload,
    NewUserPayload, QuestionDto, QuestionPayload, RefreshRequest, SessionDto, TokenPairDto,
    UserDto,
};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/v1/";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

fn transport(err: reqwest::Error) -> StorageError {
    if err.is_decode() {
        StorageError::Serialization(err.to_string())
    } else {
        StorageError::Connection(err.to_string())
    }
}

/// REST client implementing the remote repositories.
///
/// The client keeps the latest token pair it issued or was handed, attaches
/// the access token to every data call, and on a 401 refreshes once and
/// retries the request.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<RwLock<Option<Credentials>>>,
    store: Option<Arc<dyn CredentialStore>>,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport)?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            tokens: Arc::new(RwLock::new(None)),
            store: None,
        })
    }

    /// Persist refreshed tokens through `store`.
    #[must_use]
    pub fn with_credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_credentials(&self, credentials: Option<Credentials>) {
        if let Ok(mut slot) = self.tokens.write() {
            *slot = credentials;
        }
    }

    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        self.tokens.read().ok().and_then(|slot| slot.clone())
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_once<B: Serialize + Sync>(
        &self,
        method: &Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, StorageError> {
        let token = self.credentials();
        let mut builder = self.request(
            method.clone(),
            path,
            token.as_ref().map(Credentials::access_token),
        );
        if let Some(body) = body {
            builder = builder.json(body);
        }
        debug!(%method, path, "api request");
        builder.send().await.map_err(transport)
    }

    /// Authenticated call with one refresh-and-retry on 401.
    async fn call<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Option<T>, StorageError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        let mut response = self.send_once(&method, path, body).await?;
        if response.status() == StatusCode::UNAUTHORIZED && self.refresh_stored().await? {
            response = self.send_once(&method, path, body).await?;
        }
        decode(response).await
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, StorageError> {
        self.call::<T, ()>(Method::GET, path, None)
            .await?
            .ok_or_else(|| StorageError::Serialization(format!("{path}: response has no data")))
    }

    async fn send_json<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T, StorageError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        self.call::<T, B>(method, path, Some(body))
            .await?
            .ok_or_else(|| StorageError::Serialization(format!("{path}: response has no data")))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.call::<IgnoredAny, ()>(Method::DELETE, path, None)
            .await
            .map(|_| ())
    }

    /// Refresh the held pair. `Ok(false)` means there was nothing to refresh
    /// or the server refused, in which case the held pair is dropped.
    async fn refresh_stored(&self) -> Result<bool, StorageError> {
        let Some(current) = self.credentials() else {
            return Ok(false);
        };
        match self.refresh(&current).await {
            Ok(_) => Ok(true),
            Err(StorageError::Unauthorized) => {
                warn!("refresh token rejected; dropping session");
                self.set_credentials(None);
                if let Some(store) = &self.store {
                    store.clear_credentials().await?;
                }
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<Option<T>, StorageError> {
    let status = response.status();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(StorageError::Unauthorized),
        StatusCode::NOT_FOUND => return Err(StorageError::NotFound),
        StatusCode::CONFLICT => return Err(StorageError::Conflict),
        _ => {}
    }

    let bytes = response.bytes().await.map_err(transport)?;
    if !status.is_success() {
        let message = serde_json::from_slice::<Envelope<IgnoredAny>>(&bytes)
            .ok()
            .and_then(|envelope| envelope.message)
            .unwrap_or_else(|| status.to_string());
        return Err(StorageError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    let envelope: Envelope<T> = serde_json::from_slice(&bytes)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    if !envelope.success {
        return Err(StorageError::Rejected {
            status: status.as_u16(),
            message: envelope.message.unwrap_or_default(),
        });
    }
    Ok(envelope.data)
}

#[async_trait]
impl AuthGateway for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginGrant, StorageError> {
        let response = self
            .request(Method::POST, "auth/login", None)
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(transport)?;
        let data: LoginDto = decode(response)
            .await?
            .ok_or_else(|| StorageError::Serialization("login response has no data".into()))?;
        let credentials = Credentials::new(data.access_token, data.refresh_token);
        self.set_credentials(Some(credentials.clone()));
        Ok(LoginGrant {
            user: data.user.into(),
            credentials,
        })
    }

    async fn logout(&self, credentials: &Credentials) -> Result<(), StorageError> {
        let response = self
            .request(Method::POST, "auth/logout", Some(credentials.access_token()))
            .send()
            .await
            .map_err(transport)?;
        self.set_credentials(None);
        decode::<IgnoredAny>(response).await.map(|_| ())
    }

    async fn profile(&self, credentials: &Credentials) -> Result<User, StorageError> {
        let response = self
            .request(Method::GET, "auth/profile", Some(credentials.access_token()))
            .send()
            .await
            .map_err(transport)?;
        let user: UserDto = decode(response)
            .await?
            .ok_or_else(|| StorageError::Serialization("profile response has no data".into()))?;
        Ok(user.into())
    }

    async fn refresh(&self, credentials: &Credentials) -> Result<Credentials, StorageError> {
        let response = self
            .request(
                Method::POST,
                "auth/refresh-token",
                Some(credentials.access_token()),
            )
            .json(&RefreshRequest {
                refresh_token: credentials.refresh_token(),
            })
            .send()
            .await
            .map_err(transport)?;
        let pair: TokenPairDto = decode(response)
            .await?
            .ok_or_else(|| StorageError::Serialization("refresh response has no data".into()))?;
        let fresh = Credentials::from(pair);
        self.set_credentials(Some(fresh.clone()));
        if let Some(store) = &self.store {
            store.save_credentials(&fresh).await?;
        }
        Ok(fresh)
    }
}

#[async_trait]
impl AssessmentRepository for ApiClient {
    async fn list_assessments(&self) -> Result<Vec<Assessment>, StorageError> {
        let items: Vec<AssessmentDto> = self.fetch("competencies").await?;
        Ok(items.into_iter().map(AssessmentDto::into_assessment).collect())
    }

    async fn questions_for_level(&self, level: Level) -> Result<Option<LevelBlock>, StorageError> {
        let path = format!("competencies/level/{level}");
        match self.call::<AssessmentDto, ()>(Method::GET, &path, None).await {
            Ok(Some(dto)) => Ok(dto.into_first_block(level)),
            Ok(None) | Err(StorageError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_assessment(&self, draft: &NewAssessment) -> Result<Assessment, StorageError> {
        let created: AssessmentDto = self
            .send_json(
                Method::POST,
                "competencies/create",
                &NewAssessmentPayload::from(draft),
            )
            .await?;
        Ok(created.into_assessment())
    }

    async fn delete_assessment(&self, id: &AssessmentId) -> Result<(), StorageError> {
        self.delete(&format!("competencies/{id}")).await
    }
}

#[async_trait]
impl QuestionRepository for ApiClient {
    async fn create_question(
        &self,
        question: &ValidatedQuestion,
    ) -> Result<QuestionRecord, StorageError> {
        let created: QuestionDto = self
            .send_json(
                Method::POST,
                "questions/create",
                &QuestionPayload::from(question),
            )
            .await?;
        Ok(created.into_record())
    }

    async fn list_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        let items: Vec<QuestionDto> = self.fetch("questions").await?;
        Ok(items.into_iter().map(QuestionDto::into_record).collect())
    }

    async fn list_by_competency(
        &self,
        competency: &AssessmentId,
    ) -> Result<Vec<QuestionRecord>, StorageError> {
        let items: Vec<QuestionDto> = self
            .fetch(&format!("questions/competency/{competency}"))
            .await?;
        Ok(items.into_iter().map(QuestionDto::into_record).collect())
    }

    async fn get_question(&self, id: &QuestionId) -> Result<Option<QuestionRecord>, StorageError> {
        match self.fetch::<QuestionDto>(&format!("questions/get/{id}")).await {
            Ok(dto) => Ok(Some(dto.into_record())),
            Err(StorageError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn update_question(
        &self,
        id: &QuestionId,
        question: &ValidatedQuestion,
    ) -> Result<QuestionRecord, StorageError> {
        let updated: QuestionDto = self
            .send_json(
                Method::PATCH,
                &format!("questions/update/{id}"),
                &QuestionPayload::from(question),
            )
            .await?;
        Ok(updated.into_record())
    }

    async fn remove_question(&self, id: &QuestionId) -> Result<(), StorageError> {
        self.delete(&format!("questions/remove/{id}")).await
    }
}

fn sessions_from(items: Vec<SessionDto>) -> Vec<SessionRecord> {
    items
        .into_iter()
        .filter_map(|dto| match SessionRecord::try_from(dto) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(%err, "skipping unreadable session");
                None
            }
        })
        .collect()
}

#[async_trait]
impl SessionRepository for ApiClient {
    async fn create_session(&self, record: &SessionRecord) -> Result<SessionId, StorageError> {
        let created: CreatedDto = self
            .send_json(Method::POST, "sessions/create", &SessionDto::from(record))
            .await?;
        Ok(SessionId::new(created.id))
    }

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, StorageError> {
        Ok(sessions_from(self.fetch("sessions").await?))
    }

    async fn sessions_by_level(&self, level: Level) -> Result<Vec<SessionRecord>, StorageError> {
        Ok(sessions_from(
            self.fetch(&format!("sessions/level/{level}")).await?,
        ))
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), StorageError> {
        self.delete(&format!("sessions/{id}")).await
    }
}

#[async_trait]
impl UserRepository for ApiClient {
    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let items: Vec<UserDto> = self.fetch("users").await?;
        Ok(items.into_iter().map(User::from).collect())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, StorageError> {
        let created: UserDto = self
            .send_json(Method::POST, "users", &NewUserPayload::from(user))
            .await?;
        Ok(created.into())
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), StorageError> {
        self.delete(&format!("users/{id}")).await
    }
}
