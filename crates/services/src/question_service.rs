use std::sync::Arc;

use certify_core::model::{AssessmentId, QuestionDraft, QuestionId};
use storage::repository::{QuestionRecord, QuestionRepository};
use tracing::info;

use crate::cache::{CacheTag, QueryCache};
use crate::error::QuestionServiceError;

/// Question bank management for the dashboard.
///
/// Question changes also invalidate assessment queries, since level blocks
/// are built from the same questions.
#[derive(Clone)]
pub struct QuestionService {
    repo: Arc<dyn QuestionRepository>,
    cache: QueryCache,
}

impl QuestionService {
    #[must_use]
    pub fn new(repo: Arc<dyn QuestionRepository>, cache: QueryCache) -> Self {
        Self { repo, cache }
    }

    fn invalidate(&self) {
        self.cache.invalidate(CacheTag::Question);
        self.cache.invalidate(CacheTag::Assessment);
    }

    /// # Errors
    ///
    /// Returns `QuestionServiceError::Question` for an invalid draft, or a
    /// storage error.
    pub async fn create(&self, draft: QuestionDraft) -> Result<QuestionRecord, QuestionServiceError> {
        let validated = draft.validate()?;
        let created = self.repo.create_question(&validated).await?;
        info!(question = %created.question.id(), level = %validated.level, "question created");
        self.invalidate();
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns `QuestionServiceError` if the listing cannot be fetched.
    pub async fn list(&self, force: bool) -> Result<Arc<Vec<QuestionRecord>>, QuestionServiceError> {
        self.cache
            .get_or_fetch(CacheTag::Question, "all", force, || async {
                self.repo
                    .list_questions()
                    .await
                    .map_err(QuestionServiceError::from)
            })
            .await
    }

    /// # Errors
    ///
    /// Returns `QuestionServiceError` if the listing cannot be fetched.
    pub async fn list_by_competency(
        &self,
        competency: &AssessmentId,
    ) -> Result<Arc<Vec<QuestionRecord>>, QuestionServiceError> {
        let key = format!("competency:{competency}");
        self.cache
            .get_or_fetch(CacheTag::Question, &key, false, || async {
                self.repo
                    .list_by_competency(competency)
                    .await
                    .map_err(QuestionServiceError::from)
            })
            .await
    }

    /// # Errors
    ///
    /// Returns `QuestionServiceError` if the lookup fails.
    pub async fn get(&self, id: &QuestionId) -> Result<Option<QuestionRecord>, QuestionServiceError> {
        Ok(self.repo.get_question(id).await?)
    }

    /// # Errors
    ///
    /// Returns `QuestionServiceError::Question` for an invalid draft, or a
    /// storage error.
    pub async fn update(
        &self,
        id: &QuestionId,
        draft: QuestionDraft,
    ) -> Result<QuestionRecord, QuestionServiceError> {
        let validated = draft.validate()?;
        let updated = self.repo.update_question(id, &validated).await?;
        self.invalidate();
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns `QuestionServiceError` if the delete fails.
    pub async fn remove(&self, id: &QuestionId) -> Result<(), QuestionServiceError> {
        self.repo.remove_question(id).await?;
        info!(question = %id, "question removed");
        self.invalidate();
        Ok(())
    }
}
