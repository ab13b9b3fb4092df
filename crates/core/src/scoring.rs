use std::fmt;
use thiserror::Error;

use crate::ledger::AnswerLedger;
use crate::model::Question;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("score must be a finite percentage in [0, 100], got {value}")]
pub struct ScoreError {
    value: f64,
}

/// Percentage of correctly answered questions, `0.0..=100.0`, unrounded.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Score(f64);

impl Score {
    pub const ZERO: Score = Score(0.0);

    /// `100 * correct / total`; `None` for an empty set.
    ///
    /// `correct` is clamped to `total`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_counts(correct: usize, total: usize) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let correct = correct.min(total);
        Some(Self(100.0 * correct as f64 / total as f64))
    }

    /// # Errors
    ///
    /// Returns `ScoreError` for non-finite values or values outside `[0, 100]`.
    pub fn from_percent(value: f64) -> Result<Self, ScoreError> {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(ScoreError { value });
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn percent(self) -> f64 {
        self.0
    }
}

/// Two decimals, the way results are shown to the user.
impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub correct: usize,
    pub total: usize,
}

impl Tally {
    #[must_use]
    pub fn score(self) -> Option<Score> {
        Score::from_counts(self.correct, self.total)
    }
}

/// Count questions whose recorded option is flagged correct.
///
/// Unanswered questions count as incorrect.
#[must_use]
pub fn tally(questions: &[Question], ledger: &AnswerLedger) -> Tally {
    let correct = questions
        .iter()
        .filter(|question| {
            ledger
                .lookup(question.id())
                .is_some_and(|selected| question.is_correct_answer(selected))
        })
        .count();

    Tally {
        correct,
        total: questions.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerOption, OptionId, QuestionId};

    fn question(id: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("prompt {id}"),
            vec![
                AnswerOption::new(OptionId::new(format!("{id}-ok")), "right", true),
                AnswerOption::new(OptionId::new(format!("{id}-no")), "wrong", false),
            ],
            None,
        )
    }

    #[test]
    fn empty_set_has_no_score() {
        assert!(Score::from_counts(0, 0).is_none());
        assert!(tally(&[], &AnswerLedger::new()).score().is_none());
    }

    #[test]
    fn score_stays_within_bounds() {
        for total in 1..=12 {
            for correct in 0..=total + 2 {
                let score = Score::from_counts(correct, total).unwrap().percent();
                assert!((0.0..=100.0).contains(&score), "{correct}/{total} -> {score}");
            }
        }
    }

    #[test]
    fn unanswered_questions_count_as_incorrect() {
        let questions = vec![question("q1"), question("q2"), question("q3"), question("q4")];
        let mut ledger = AnswerLedger::new();
        ledger.record(QuestionId::new("q1"), OptionId::new("q1-ok"));
        ledger.record(QuestionId::new("q2"), OptionId::new("q2-no"));

        let result = tally(&questions, &ledger);
        assert_eq!(result, Tally { correct: 1, total: 4 });
        assert_eq!(result.score(), Some(Score::from_percent(25.0).unwrap()));
    }

    #[test]
    fn score_is_not_rounded() {
        let score = Score::from_counts(1, 3).unwrap();
        assert!((score.percent() - 100.0 / 3.0).abs() < 1e-12);
        assert_eq!(score.to_string(), "33.33");
    }

    #[test]
    fn from_percent_rejects_out_of_range() {
        assert!(Score::from_percent(-0.1).is_err());
        assert!(Score::from_percent(100.5).is_err());
        assert!(Score::from_percent(f64::NAN).is_err());
        assert!(Score::from_percent(100.0).is_ok());
    }
}
