use crate::model::ids::AssessmentId;
use crate::model::level::{CertifiedLevel, Level};
use crate::model::question::Question;

/// Questions for one proficiency level, in presentation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelBlock {
    level: Level,
    questions: Vec<Question>,
}

impl LevelBlock {
    #[must_use]
    pub fn new(level: Level, questions: Vec<Question>) -> Self {
        Self { level, questions }
    }

    #[must_use]
    pub fn empty(level: Level) -> Self {
        Self::new(level, Vec::new())
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn into_questions(self) -> Vec<Question> {
        self.questions
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// A previous result carried on the competency record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorResult {
    pub score: f64,
    pub certified: CertifiedLevel,
    pub no_retake: bool,
}

/// A competency the user can be assessed on.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    id: AssessmentId,
    name: String,
    description: String,
    prior: Option<PriorResult>,
    blocks: Vec<LevelBlock>,
}

impl Assessment {
    #[must_use]
    pub fn new(id: AssessmentId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            prior: None,
            blocks: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_prior(mut self, prior: PriorResult) -> Self {
        self.prior = Some(prior);
        self
    }

    #[must_use]
    pub fn with_blocks(mut self, blocks: Vec<LevelBlock>) -> Self {
        self.blocks = blocks;
        self
    }

    #[must_use]
    pub fn id(&self) -> &AssessmentId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn prior(&self) -> Option<PriorResult> {
        self.prior
    }

    #[must_use]
    pub fn blocks(&self) -> &[LevelBlock] {
        &self.blocks
    }

    /// The block for `level`, if the record carries one.
    #[must_use]
    pub fn block(&self, level: Level) -> Option<&LevelBlock> {
        self.blocks.iter().find(|block| block.level() == level)
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.blocks.iter().map(|block| block.questions().len()).sum()
    }
}
