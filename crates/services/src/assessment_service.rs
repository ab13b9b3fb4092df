use std::sync::Arc;

use certify_core::Step;
use certify_core::model::{Assessment, AssessmentId, Level, LevelBlock, Question};
use storage::repository::{AssessmentRepository, NewAssessment};
use tracing::{debug, warn};

use crate::cache::{CacheTag, QueryCache};
use crate::error::AssessmentServiceError;

/// Competency listing and per-level question fetches.
#[derive(Clone)]
pub struct AssessmentService {
    repo: Arc<dyn AssessmentRepository>,
    cache: QueryCache,
}

impl AssessmentService {
    #[must_use]
    pub fn new(repo: Arc<dyn AssessmentRepository>, cache: QueryCache) -> Self {
        Self { repo, cache }
    }

    /// # Errors
    ///
    /// Returns `AssessmentServiceError` if the listing cannot be fetched.
    pub async fn list(&self, force: bool) -> Result<Arc<Vec<Assessment>>, AssessmentServiceError> {
        self.cache
            .get_or_fetch(CacheTag::Assessment, "all", force, || async {
                self.repo
                    .list_assessments()
                    .await
                    .map_err(AssessmentServiceError::from)
            })
            .await
    }

    /// Block for `level`, or `None` if the competency has none.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentServiceError` if the fetch fails.
    pub async fn block(
        &self,
        level: Level,
        force: bool,
    ) -> Result<Arc<Option<LevelBlock>>, AssessmentServiceError> {
        let key = format!("level:{level}");
        self.cache
            .get_or_fetch(CacheTag::Assessment, &key, force, || async {
                self.repo
                    .questions_for_level(level)
                    .await
                    .map_err(AssessmentServiceError::from)
            })
            .await
    }

    /// Questions for `step`'s primary level.
    ///
    /// A missing block or failed fetch yields an empty set so the step shows
    /// its empty state. Malformed questions are kept and logged.
    pub async fn questions_for_step(&self, step: Step) -> Vec<Question> {
        let level = step.primary_level();
        let block = match self.block(level, false).await {
            Ok(block) => block,
            Err(err) => {
                warn!(%level, %err, "question fetch failed; showing empty step");
                return Vec::new();
            }
        };
        let Some(block) = block.as_ref() else {
            debug!(%level, "no question block for level");
            return Vec::new();
        };
        for question in block.questions() {
            if let Some(issue) = question.issue() {
                warn!(question = %question.id(), ?issue, "malformed question");
            }
        }
        block.questions().to_vec()
    }

    /// # Errors
    ///
    /// Returns `AssessmentServiceError::EmptyName` for a blank name, or a
    /// storage error.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Assessment, AssessmentServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AssessmentServiceError::EmptyName);
        }
        let created = self
            .repo
            .create_assessment(&NewAssessment {
                name: name.to_string(),
                description: description.trim().to_string(),
            })
            .await?;
        self.cache.invalidate(CacheTag::Assessment);
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns `AssessmentServiceError` if the delete fails.
    pub async fn delete(&self, id: &AssessmentId) -> Result<(), AssessmentServiceError> {
        self.repo.delete_assessment(id).await?;
        self.cache.invalidate(CacheTag::Assessment);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certify_core::model::{AnswerOption, OptionId, QuestionId};
    use storage::memory::InMemoryRepository;

    fn question(id: &str, correct: usize) -> Question {
        let options = (0..2)
            .map(|i| AnswerOption::new(OptionId::new(format!("{id}-{i}")), "x", i < correct))
            .collect();
        Question::new(QuestionId::new(id), "?", options, None)
    }

    #[tokio::test]
    async fn step_fetches_its_lower_level_only() {
        let repo = InMemoryRepository::new();
        repo.insert_question(Level::B1, question("b1", 1)).unwrap();
        repo.insert_question(Level::B2, question("b2", 1)).unwrap();
        let service = AssessmentService::new(Arc::new(repo), QueryCache::new());

        let questions = service.questions_for_step(Step::Two).await;
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id().as_str(), "b1");
        assert!(service.questions_for_step(Step::Three).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_questions_are_kept() {
        let repo = InMemoryRepository::new();
        repo.insert_question(Level::A1, question("none", 0)).unwrap();
        repo.insert_question(Level::A1, question("both", 2)).unwrap();
        let service = AssessmentService::new(Arc::new(repo), QueryCache::new());
        assert_eq!(service.questions_for_step(Step::One).await.len(), 2);
    }

    #[tokio::test]
    async fn create_invalidates_listing() {
        let repo = InMemoryRepository::new();
        let service = AssessmentService::new(Arc::new(repo), QueryCache::new());
        assert!(service.list(false).await.unwrap().is_empty());

        service.create("Digital literacy", "basics").await.unwrap();
        assert_eq!(service.list(false).await.unwrap().len(), 1);
        assert!(matches!(
            service.create("  ", "").await,
            Err(AssessmentServiceError::EmptyName)
        ));
    }
}
