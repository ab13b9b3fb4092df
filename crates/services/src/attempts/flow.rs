use certify_core::model::{
    AssessmentId, OptionId, PriorResult, Question, SessionRecord, SessionRecordDraft, UserId,
};
use certify_core::{
    Advance, Attempt, AttemptResult, AttemptState, EmptyStepPolicy, RetakePolicy, Step,
    StepOutcome, StepRunner, StepStatus, StepTick, TimerGeneration, Transition,
};
use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info};

use super::timer::StepTimer;
use crate::error::AttemptFlowError;

/// What changed after feeding the flow an input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlowEvent {
    /// Questions installed; the first one is active.
    Loaded { total: usize },
    /// The step has no questions and is waiting.
    Empty,
    Counting { remaining: u32 },
    /// Moved to the question at `index`.
    Moved { index: usize },
    StepFinished {
        outcome: StepOutcome,
        transition: Transition,
    },
    /// A stale or out-of-state tick.
    Ignored,
}

/// One user's pass through the steps, with the active step's runner and
/// its countdown task.
///
/// Ticks arrive on the receiver returned by [`AttemptFlow::start`]; pass
/// each one to [`AttemptFlow::on_tick`].
#[derive(Debug)]
pub struct AttemptFlow {
    attempt: Attempt,
    runner: StepRunner,
    timer: StepTimer,
    empty_step: EmptyStepPolicy,
    started_at: DateTime<Utc>,
}

impl AttemptFlow {
    #[must_use]
    pub fn start(
        retake: RetakePolicy,
        empty_step: EmptyStepPolicy,
        prior: Option<PriorResult>,
        started_at: DateTime<Utc>,
        runtime: Option<Handle>,
    ) -> (Self, UnboundedReceiver<TimerGeneration>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let attempt = Attempt::resume(retake, prior);
        let step = attempt.current_step().unwrap_or(Step::One);
        let flow = Self {
            attempt,
            runner: StepRunner::new(step).with_empty_policy(empty_step),
            timer: StepTimer::new(runtime, tx),
            empty_step,
            started_at,
        };
        (flow, rx)
    }

    #[must_use]
    pub fn attempt(&self) -> &Attempt {
        &self.attempt
    }

    #[must_use]
    pub fn runner(&self) -> &StepRunner {
        &self.runner
    }

    #[must_use]
    pub fn state(&self) -> AttemptState {
        self.attempt.state()
    }

    #[must_use]
    pub fn current_step(&self) -> Option<Step> {
        self.attempt.current_step()
    }

    #[must_use]
    pub fn latest(&self) -> AttemptResult {
        self.attempt.latest()
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.attempt.is_terminal()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// True while the active step waits for its question set.
    #[must_use]
    pub fn needs_questions(&self) -> bool {
        !self.is_terminal() && self.runner.status() == StepStatus::Loading
    }

    /// Install the active step's questions and arm the first countdown.
    ///
    /// # Errors
    ///
    /// Returns `AttemptFlowError::Ended` once the attempt is over.
    pub fn load(&mut self, questions: Vec<Question>) -> Result<FlowEvent, AttemptFlowError> {
        if self.is_terminal() {
            return Err(AttemptFlowError::Ended);
        }
        if let Some(outcome) = self.runner.load(questions) {
            return self.finish_step(outcome);
        }
        match self.runner.status() {
            StepStatus::Answering => {
                self.timer.start(self.runner.timer_generation());
                Ok(FlowEvent::Loaded {
                    total: self.runner.total(),
                })
            }
            _ => {
                self.timer.cancel();
                debug!(step = %self.runner.step(), "step has no questions");
                Ok(FlowEvent::Empty)
            }
        }
    }

    /// # Errors
    ///
    /// Returns `AttemptFlowError::Step` when no question is active or the
    /// option does not belong to it.
    pub fn select(&mut self, option: OptionId) -> Result<(), AttemptFlowError> {
        self.ensure_active()?;
        self.runner.select(option)?;
        Ok(())
    }

    /// Manual "Next Question" / "Finish Test".
    ///
    /// # Errors
    ///
    /// Returns `AttemptFlowError::Step` when the current question is
    /// unanswered or no question is active.
    pub fn next(&mut self) -> Result<FlowEvent, AttemptFlowError> {
        self.ensure_active()?;
        let advance = self.runner.next()?;
        self.apply_advance(advance)
    }

    /// Feed one timer tick.
    ///
    /// # Errors
    ///
    /// Returns `AttemptFlowError::Attempt` if a finished step cannot be
    /// applied to the attempt.
    pub fn on_tick(&mut self, generation: TimerGeneration) -> Result<FlowEvent, AttemptFlowError> {
        if self.is_terminal() {
            return Ok(FlowEvent::Ignored);
        }
        match self.runner.tick(generation) {
            StepTick::Counting { remaining } => Ok(FlowEvent::Counting { remaining }),
            StepTick::Advanced(advance) => self.apply_advance(advance),
            StepTick::Ignored => Ok(FlowEvent::Ignored),
        }
    }

    /// Stop the countdown, e.g. when the view is torn down.
    pub fn cancel(&mut self) {
        self.runner.cancel_timer();
        self.timer.cancel();
    }

    /// Record to report once the attempt has ended with at least one
    /// finished step.
    ///
    /// # Errors
    ///
    /// Returns `AttemptFlowError::Record` if `completed_at` precedes the
    /// start of the attempt.
    pub fn session_record(
        &self,
        assessment_id: AssessmentId,
        user_id: Option<UserId>,
        completed_at: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, AttemptFlowError> {
        if !self.is_terminal() || self.attempt.history().is_empty() {
            return Ok(None);
        }
        let latest = self.attempt.latest();
        let record = SessionRecord::new(SessionRecordDraft {
            attempt_id: self.attempt.id(),
            assessment_id,
            user_id,
            score: latest.score,
            certified: latest.certified,
            no_retake: latest.no_retake,
            steps_completed: self.attempt.steps_completed(),
            started_at: self.started_at,
            completed_at,
        })?;
        Ok(Some(record))
    }

    fn ensure_active(&self) -> Result<(), AttemptFlowError> {
        if self.is_terminal() {
            Err(AttemptFlowError::Ended)
        } else {
            Ok(())
        }
    }

    fn apply_advance(&mut self, advance: Advance) -> Result<FlowEvent, AttemptFlowError> {
        match advance {
            Advance::Moved { index, generation } => {
                self.timer.start(generation);
                Ok(FlowEvent::Moved { index })
            }
            Advance::Finished(outcome) => self.finish_step(outcome),
        }
    }

    fn finish_step(&mut self, outcome: StepOutcome) -> Result<FlowEvent, AttemptFlowError> {
        self.timer.cancel();
        let transition = self.attempt.apply(outcome)?;
        info!(
            step = %outcome.step,
            score = outcome.score.percent(),
            certified = %outcome.certified,
            no_retake = outcome.no_retake,
            ?transition,
            "step finished"
        );
        if let Transition::Advanced(step) | Transition::Repeated(step) = transition {
            self.runner = StepRunner::new(step)
                .with_empty_policy(self.empty_step)
                .continuing_from(self.runner.timer_generation());
        }
        Ok(FlowEvent::StepFinished {
            outcome,
            transition,
        })
    }
}
