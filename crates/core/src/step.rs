//! Runs one leveled block of questions to completion.

use thiserror::Error;

use crate::certification::{Step, StepOutcome, certify};
use crate::countdown::{Countdown, Tick, TimerGeneration};
use crate::ledger::AnswerLedger;
use crate::model::{OptionId, Question};
use crate::scoring::{Score, tally};

/// What to do when a step receives no questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyStepPolicy {
    /// Stay in the empty state; no outcome is ever reported.
    #[default]
    Stuck,
    /// Report a zero score immediately.
    ZeroScore,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown empty-step policy: {0} (expected stuck or zero)")]
pub struct ParseEmptyStepPolicyError(String);

impl std::str::FromStr for EmptyStepPolicy {
    type Err = ParseEmptyStepPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stuck" => Ok(EmptyStepPolicy::Stuck),
            "zero" | "zero-score" => Ok(EmptyStepPolicy::ZeroScore),
            other => Err(ParseEmptyStepPolicyError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Loading,
    Empty,
    Answering,
    Finished,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepError {
    #[error("questions have not been loaded yet")]
    Loading,
    #[error("no questions available for this step")]
    NoQuestions,
    #[error("step already finished")]
    Finished,
    #[error("option {0} does not belong to the current question")]
    UnknownOption(OptionId),
    #[error("current question has no answer yet")]
    Unanswered,
}

/// Result of moving past the current question.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Advance {
    Moved {
        index: usize,
        generation: TimerGeneration,
    },
    Finished(StepOutcome),
}

/// Result of feeding one timer tick into the runner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepTick {
    Counting { remaining: u32 },
    Advanced(Advance),
    Ignored,
}

#[derive(Debug, Clone)]
pub struct StepRunner {
    step: Step,
    questions: Vec<Question>,
    index: usize,
    ledger: AnswerLedger,
    countdown: Countdown,
    status: StepStatus,
    outcome: Option<StepOutcome>,
    empty_policy: EmptyStepPolicy,
}

impl StepRunner {
    #[must_use]
    pub fn new(step: Step) -> Self {
        Self {
            step,
            questions: Vec::new(),
            index: 0,
            ledger: AnswerLedger::new(),
            countdown: Countdown::new(),
            status: StepStatus::Loading,
            outcome: None,
            empty_policy: EmptyStepPolicy::default(),
        }
    }

    /// Keep timer generations increasing across runners of one attempt, so
    /// a tick queued by the previous runner is never accepted by this one.
    #[must_use]
    pub fn continuing_from(mut self, last: TimerGeneration) -> Self {
        self.countdown = Countdown::continuing_from(last);
        self
    }

    #[must_use]
    pub fn with_empty_policy(mut self, policy: EmptyStepPolicy) -> Self {
        self.empty_policy = policy;
        self
    }

    /// Install a fresh question set, resetting index, answers and timer.
    ///
    /// Returns an outcome only when the set is empty and the policy is
    /// [`EmptyStepPolicy::ZeroScore`].
    pub fn load(&mut self, questions: Vec<Question>) -> Option<StepOutcome> {
        self.countdown.stop();
        self.questions = questions;
        self.index = 0;
        self.ledger.clear();
        self.outcome = None;

        let Some(first_limit) = self.questions.first().map(Question::time_limit) else {
            return match self.empty_policy {
                EmptyStepPolicy::Stuck => {
                    self.status = StepStatus::Empty;
                    None
                }
                EmptyStepPolicy::ZeroScore => {
                    let outcome = certify(self.step, Score::ZERO);
                    self.status = StepStatus::Finished;
                    self.outcome = Some(outcome);
                    Some(outcome)
                }
            };
        };

        self.status = StepStatus::Answering;
        self.countdown.restart(first_limit);
        None
    }

    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    #[must_use]
    pub fn status(&self) -> StepStatus {
        self.status
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.status {
            StepStatus::Answering => self.questions.get(self.index),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.index + 1 >= self.questions.len()
    }

    #[must_use]
    pub fn ledger(&self) -> &AnswerLedger {
        &self.ledger
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<&OptionId> {
        self.current_question()
            .and_then(|question| self.ledger.lookup(question.id()))
    }

    #[must_use]
    pub fn is_selected(&self, option: &OptionId) -> bool {
        self.selected_option() == Some(option)
    }

    /// Manual "Next" is only enabled once the current question is answered.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.selected_option().is_some()
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining()
    }

    #[must_use]
    pub fn timer_generation(&self) -> TimerGeneration {
        self.countdown.generation()
    }

    #[must_use]
    pub fn timer_running(&self) -> bool {
        self.countdown.is_running()
    }

    #[must_use]
    pub fn outcome(&self) -> Option<StepOutcome> {
        self.outcome
    }

    /// Record `option` for the current question, replacing any prior choice.
    ///
    /// # Errors
    ///
    /// Returns `StepError` when no question is active or the option is not
    /// one of the current question's options.
    pub fn select(&mut self, option: OptionId) -> Result<(), StepError> {
        self.ensure_answering()?;
        let question = &self.questions[self.index];
        if question.option(&option).is_none() {
            return Err(StepError::UnknownOption(option));
        }
        self.ledger.record(question.id().clone(), option);
        Ok(())
    }

    /// Manual advance.
    ///
    /// # Errors
    ///
    /// Returns `StepError::Unanswered` when the current question has no
    /// recorded answer, or another `StepError` when no question is active.
    pub fn next(&mut self) -> Result<Advance, StepError> {
        self.ensure_answering()?;
        if !self.can_advance() {
            return Err(StepError::Unanswered);
        }
        Ok(self.advance())
    }

    /// Timer-driven advance; does not require an answer.
    ///
    /// # Errors
    ///
    /// Returns `StepError` when no question is active.
    pub fn expire(&mut self) -> Result<Advance, StepError> {
        self.ensure_answering()?;
        Ok(self.advance())
    }

    /// Feed one tick for `generation`; expiry auto-advances.
    pub fn tick(&mut self, generation: TimerGeneration) -> StepTick {
        if self.status != StepStatus::Answering {
            return StepTick::Ignored;
        }
        match self.countdown.tick(generation) {
            Tick::Running { remaining } => StepTick::Counting { remaining },
            Tick::Expired => StepTick::Advanced(self.advance()),
            Tick::Stale | Tick::Stopped => StepTick::Ignored,
        }
    }

    /// Stop the countdown, e.g. when the runner is torn down.
    pub fn cancel_timer(&mut self) {
        self.countdown.stop();
    }

    fn ensure_answering(&self) -> Result<(), StepError> {
        match self.status {
            StepStatus::Answering => Ok(()),
            StepStatus::Loading => Err(StepError::Loading),
            StepStatus::Empty => Err(StepError::NoQuestions),
            StepStatus::Finished => Err(StepError::Finished),
        }
    }

    fn advance(&mut self) -> Advance {
        if self.index + 1 < self.questions.len() {
            self.index += 1;
            let limit = self.questions[self.index].time_limit();
            let generation = self.countdown.restart(limit);
            return Advance::Moved {
                index: self.index,
                generation,
            };
        }
        Advance::Finished(self.finalize())
    }

    fn finalize(&mut self) -> StepOutcome {
        self.countdown.stop();
        let score = tally(&self.questions, &self.ledger)
            .score()
            .unwrap_or(Score::ZERO);
        let outcome = certify(self.step, score);
        self.status = StepStatus::Finished;
        self.outcome = Some(outcome);
        outcome
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerOption, CertifiedLevel, Level, QuestionId};

    fn question(id: &str, limit: Option<u32>) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("prompt {id}"),
            vec![
                AnswerOption::new(OptionId::new(format!("{id}-ok")), "right", true),
                AnswerOption::new(OptionId::new(format!("{id}-no")), "wrong", false),
            ],
            limit,
        )
    }

    fn runner(step: Step, n: usize) -> StepRunner {
        let mut runner = StepRunner::new(step);
        let questions = (1..=n).map(|i| question(&format!("q{i}"), Some(10))).collect();
        assert!(runner.load(questions).is_none());
        runner
    }

    #[test]
    fn load_resets_index_answers_and_timer() {
        let mut runner = StepRunner::new(Step::One);
        assert_eq!(runner.status(), StepStatus::Loading);
        runner.load(vec![question("q1", Some(15)), question("q2", None)]);

        assert_eq!(runner.status(), StepStatus::Answering);
        assert_eq!(runner.current_index(), 0);
        assert_eq!(runner.remaining_secs(), 15);
        runner.select(OptionId::new("q1-ok")).unwrap();

        runner.load(vec![question("q9", None)]);
        assert!(runner.ledger().is_empty());
        assert_eq!(runner.remaining_secs(), 60);
    }

    #[test]
    fn manual_next_requires_answer() {
        let mut runner = runner(Step::One, 2);
        assert!(!runner.can_advance());
        assert_eq!(runner.next().unwrap_err(), StepError::Unanswered);

        runner.select(OptionId::new("q1-no")).unwrap();
        assert!(runner.can_advance());
        assert!(matches!(runner.next().unwrap(), Advance::Moved { index: 1, .. }));
    }

    #[test]
    fn selecting_foreign_option_is_rejected() {
        let mut runner = runner(Step::One, 2);
        let err = runner.select(OptionId::new("q2-ok")).unwrap_err();
        assert_eq!(err, StepError::UnknownOption(OptionId::new("q2-ok")));
    }

    #[test]
    fn reselecting_overwrites() {
        let mut runner = runner(Step::One, 1);
        runner.select(OptionId::new("q1-ok")).unwrap();
        runner.select(OptionId::new("q1-no")).unwrap();
        assert!(runner.is_selected(&OptionId::new("q1-no")));
        assert!(!runner.is_selected(&OptionId::new("q1-ok")));
    }

    #[test]
    fn advancing_past_last_question_finalizes_once() {
        let mut runner = runner(Step::One, 2);
        runner.select(OptionId::new("q1-ok")).unwrap();
        runner.next().unwrap();
        runner.select(OptionId::new("q2-ok")).unwrap();

        let Advance::Finished(outcome) = runner.next().unwrap() else {
            panic!("expected finish");
        };
        assert!((outcome.score.percent() - 100.0).abs() < f64::EPSILON);
        assert_eq!(outcome.certified, CertifiedLevel::Level(Level::A2));
        assert!(!runner.timer_running());

        assert_eq!(runner.next().unwrap_err(), StepError::Finished);
        assert_eq!(runner.expire().unwrap_err(), StepError::Finished);
        assert_eq!(runner.outcome(), Some(outcome));
    }

    #[test]
    fn timer_expiry_advances_without_answer() {
        let mut runner = runner(Step::One, 2);
        let generation = runner.timer_generation();
        for remaining in (1..10).rev() {
            assert_eq!(runner.tick(generation), StepTick::Counting { remaining });
        }
        let StepTick::Advanced(Advance::Moved { index, generation }) = runner.tick(generation)
        else {
            panic!("expected auto-advance");
        };
        assert_eq!(index, 1);
        assert_eq!(runner.remaining_secs(), 10);

        runner.select(OptionId::new("q2-ok")).unwrap();
        let Advance::Finished(outcome) = runner.expire().unwrap() else {
            panic!("expected finish");
        };
        // q1 timed out unanswered, so only one of two is correct.
        assert!((outcome.score.percent() - 50.0).abs() < f64::EPSILON);
        assert_eq!(runner.tick(generation), StepTick::Ignored);
    }

    #[test]
    fn question_change_invalidates_previous_countdown() {
        let mut runner = runner(Step::Two, 3);
        let first = runner.timer_generation();
        runner.select(OptionId::new("q1-ok")).unwrap();
        runner.next().unwrap();

        assert_eq!(runner.tick(first), StepTick::Ignored);
        assert_eq!(runner.remaining_secs(), 10);
        let current = runner.timer_generation();
        assert_eq!(runner.tick(current), StepTick::Counting { remaining: 9 });
    }

    #[test]
    fn empty_set_is_stuck_by_default() {
        let mut runner = StepRunner::new(Step::One);
        assert!(runner.load(Vec::new()).is_none());
        assert_eq!(runner.status(), StepStatus::Empty);
        assert_eq!(runner.next().unwrap_err(), StepError::NoQuestions);
        assert_eq!(runner.expire().unwrap_err(), StepError::NoQuestions);
        assert!(runner.outcome().is_none());
        assert!(!runner.timer_running());
    }

    #[test]
    fn empty_set_can_report_zero_score() {
        let mut runner = StepRunner::new(Step::One).with_empty_policy(EmptyStepPolicy::ZeroScore);
        let outcome = runner.load(Vec::new()).unwrap();
        assert_eq!(outcome.score, Score::ZERO);
        assert!(outcome.no_retake);
        assert_eq!(runner.status(), StepStatus::Finished);
    }

    #[test]
    fn cancel_timer_stops_ticks() {
        let mut runner = runner(Step::Three, 1);
        let generation = runner.timer_generation();
        runner.cancel_timer();
        assert_eq!(runner.tick(generation), StepTick::Ignored);
        assert!(!runner.timer_running());
    }
}
