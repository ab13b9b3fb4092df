use std::sync::Arc;

use certify_core::model::{Level, SessionId, SessionRecord, SessionRecordDraft};
use storage::repository::SessionRepository;
use tracing::info;

use crate::cache::{CacheTag, QueryCache};
use crate::error::SessionServiceError;

/// Reported attempt results, as seen from the dashboard.
#[derive(Clone)]
pub struct SessionService {
    repo: Arc<dyn SessionRepository>,
    cache: QueryCache,
}

impl SessionService {
    #[must_use]
    pub fn new(repo: Arc<dyn SessionRepository>, cache: QueryCache) -> Self {
        Self { repo, cache }
    }

    /// # Errors
    ///
    /// Returns `SessionServiceError` if the listing cannot be fetched.
    pub async fn list(&self, force: bool) -> Result<Arc<Vec<SessionRecord>>, SessionServiceError> {
        self.cache
            .get_or_fetch(CacheTag::Session, "all", force, || async {
                self.repo
                    .list_sessions()
                    .await
                    .map_err(SessionServiceError::from)
            })
            .await
    }

    /// Sessions whose certified level is `level`.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError` if the listing cannot be fetched.
    pub async fn by_level(
        &self,
        level: Level,
        force: bool,
    ) -> Result<Arc<Vec<SessionRecord>>, SessionServiceError> {
        let key = format!("level:{level}");
        self.cache
            .get_or_fetch(CacheTag::Session, &key, force, || async {
                self.repo
                    .sessions_by_level(level)
                    .await
                    .map_err(SessionServiceError::from)
            })
            .await
    }

    /// Validate and report a finished attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Record` for an inconsistent draft, or a
    /// storage error.
    pub async fn create(&self, draft: SessionRecordDraft) -> Result<SessionRecord, SessionServiceError> {
        let record = SessionRecord::new(draft)?;
        self.submit(record).await
    }

    /// Report an already validated record and return it with its remote id.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if the request fails.
    pub async fn submit(&self, record: SessionRecord) -> Result<SessionRecord, SessionServiceError> {
        let id = self.repo.create_session(&record).await?;
        info!(session = %id, attempt = %record.attempt_id(), "session reported");
        self.cache.invalidate(CacheTag::Session);
        Ok(record.with_remote_id(id))
    }

    /// # Errors
    ///
    /// Returns `SessionServiceError` if the delete fails.
    pub async fn delete(&self, id: &SessionId) -> Result<(), SessionServiceError> {
        self.repo.delete_session(id).await?;
        info!(session = %id, "session deleted");
        self.cache.invalidate(CacheTag::Session);
        Ok(())
    }
}
