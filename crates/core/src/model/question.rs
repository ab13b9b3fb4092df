use thiserror::Error;

use crate::model::ids::{AssessmentId, OptionId, QuestionId};
use crate::model::level::Level;

/// Countdown used when a question carries no usable time limit.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 60;

//
// ─── OPTION ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    id: OptionId,
    text: String,
    is_correct: bool,
}

impl AnswerOption {
    #[must_use]
    pub fn new(id: OptionId, text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id,
            text: text.into(),
            is_correct,
        }
    }

    #[must_use]
    pub fn id(&self) -> &OptionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Structural problems found in fetched question data.
///
/// Fetched questions are never rejected for these; scoring treats them
/// literally (the selected option's flag decides correctness).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionIssue {
    NoCorrectOption,
    MultipleCorrectOptions,
    NoOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<AnswerOption>,
    time_limit_secs: Option<u32>,
}

impl Question {
    /// Build a question as delivered by the assessment source.
    ///
    /// A `time_limit_secs` of `None` or `0` falls back to
    /// [`DEFAULT_TIME_LIMIT_SECS`].
    #[must_use]
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<AnswerOption>,
        time_limit_secs: Option<u32>,
    ) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            options,
            time_limit_secs: time_limit_secs.filter(|secs| *secs > 0),
        }
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, id: &OptionId) -> Option<&AnswerOption> {
        self.options.iter().find(|opt| opt.id() == id)
    }

    /// Configured limit, if one was set.
    #[must_use]
    pub fn configured_time_limit(&self) -> Option<u32> {
        self.time_limit_secs
    }

    /// Effective countdown for this question in seconds.
    #[must_use]
    pub fn time_limit(&self) -> u32 {
        self.time_limit_secs.unwrap_or(DEFAULT_TIME_LIMIT_SECS)
    }

    /// Whether `selected` names an option of this question flagged correct.
    #[must_use]
    pub fn is_correct_answer(&self, selected: &OptionId) -> bool {
        self.option(selected).is_some_and(AnswerOption::is_correct)
    }

    #[must_use]
    pub fn correct_option_count(&self) -> usize {
        self.options.iter().filter(|opt| opt.is_correct()).count()
    }

    /// Report malformed answer keys without rejecting the question.
    #[must_use]
    pub fn issue(&self) -> Option<QuestionIssue> {
        if self.options.is_empty() {
            return Some(QuestionIssue::NoOptions);
        }
        match self.correct_option_count() {
            0 => Some(QuestionIssue::NoCorrectOption),
            1 => None,
            _ => Some(QuestionIssue::MultipleCorrectOptions),
        }
    }
}

//
// ─── DRAFTS (ADMIN AUTHORING) ──────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyPrompt,

    #[error("a question needs at least two options, got {count}")]
    TooFewOptions { count: usize },

    #[error("option {index} has empty text")]
    EmptyOptionText { index: usize },

    #[error("exactly one option must be correct, got {count}")]
    CorrectOptionCount { count: usize },

    #[error("time limit must be between 5 and 600 seconds, got {secs}")]
    InvalidTimeLimit { secs: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDraft {
    pub text: String,
    pub is_correct: bool,
}

impl OptionDraft {
    #[must_use]
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
        }
    }
}

/// Question authored in the admin dashboard, before it is sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub competency_id: Option<AssessmentId>,
    pub level: Level,
    pub prompt: String,
    pub options: Vec<OptionDraft>,
    pub time_limit_secs: Option<u32>,
}

/// A draft that passed validation; text is trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    pub competency_id: Option<AssessmentId>,
    pub level: Level,
    pub prompt: String,
    pub options: Vec<OptionDraft>,
    pub time_limit_secs: u32,
}

impl QuestionDraft {
    /// Validate an authored question.
    ///
    /// Unlike fetched data, authored questions must carry exactly one
    /// correct option.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` describing the first violated rule.
    pub fn validate(self) -> Result<ValidatedQuestion, QuestionError> {
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if self.options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                count: self.options.len(),
            });
        }

        let mut options = Vec::with_capacity(self.options.len());
        for (index, option) in self.options.into_iter().enumerate() {
            let text = option.text.trim().to_string();
            if text.is_empty() {
                return Err(QuestionError::EmptyOptionText { index });
            }
            options.push(OptionDraft {
                text,
                is_correct: option.is_correct,
            });
        }

        let count = options.iter().filter(|opt| opt.is_correct).count();
        if count != 1 {
            return Err(QuestionError::CorrectOptionCount { count });
        }

        let time_limit_secs = self.time_limit_secs.unwrap_or(DEFAULT_TIME_LIMIT_SECS);
        if !(5..=600).contains(&time_limit_secs) {
            return Err(QuestionError::InvalidTimeLimit {
                secs: time_limit_secs,
            });
        }

        Ok(ValidatedQuestion {
            competency_id: self.competency_id,
            level: self.level,
            prompt,
            options,
            time_limit_secs,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
