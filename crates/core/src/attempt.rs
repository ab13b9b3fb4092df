//! Multi-step attempt lifecycle.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::certification::{Step, StepOutcome};
use crate::model::{AttemptId, CertifiedLevel, PriorResult};
use crate::scoring::Score;

/// What happens after a step scores below the advance threshold without
/// triggering no-retake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetakePolicy {
    /// Stay on the same step and take it again.
    #[default]
    RepeatStep,
    /// Move on to the next step anyway.
    Advance,
    /// End the attempt with the latest result.
    Conclude,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown retake policy: {0} (expected repeat, advance or conclude)")]
pub struct ParseRetakePolicyError(String);

impl FromStr for RetakePolicy {
    type Err = ParseRetakePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "repeat" | "repeat-step" => Ok(RetakePolicy::RepeatStep),
            "advance" => Ok(RetakePolicy::Advance),
            "conclude" => Ok(RetakePolicy::Conclude),
            other => Err(ParseRetakePolicyError(other.to_string())),
        }
    }
}

impl fmt::Display for RetakePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RetakePolicy::RepeatStep => "repeat",
            RetakePolicy::Advance => "advance",
            RetakePolicy::Conclude => "conclude",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    InStep(Step),
    Failed,
    Certified,
}

impl AttemptState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, AttemptState::InStep(_))
    }
}

/// Latest `(score, certified level, no-retake)` triple, kept for display.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttemptResult {
    pub score: Score,
    pub certified: CertifiedLevel,
    pub no_retake: bool,
}

impl From<StepOutcome> for AttemptResult {
    fn from(outcome: StepOutcome) -> Self {
        Self {
            score: outcome.score,
            certified: outcome.certified,
            no_retake: outcome.no_retake,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advanced(Step),
    Repeated(Step),
    Failed,
    Certified,
}

impl Transition {
    #[must_use]
    pub fn state(self) -> AttemptState {
        match self {
            Transition::Advanced(step) | Transition::Repeated(step) => AttemptState::InStep(step),
            Transition::Failed => AttemptState::Failed,
            Transition::Certified => AttemptState::Certified,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt already ended")]
    Terminal,
    #[error("outcome for step {got} does not match active step {expected}")]
    StepMismatch { expected: Step, got: Step },
}

/// Decide where an attempt goes after `outcome` finishes `step`.
#[must_use]
pub fn transition(step: Step, outcome: &StepOutcome, policy: RetakePolicy) -> Transition {
    if outcome.no_retake {
        return Transition::Failed;
    }
    let Some(next) = step.next() else {
        return Transition::Certified;
    };
    if outcome.meets_advance_threshold() {
        return Transition::Advanced(next);
    }
    match policy {
        RetakePolicy::RepeatStep => Transition::Repeated(step),
        RetakePolicy::Advance => Transition::Advanced(next),
        RetakePolicy::Conclude => Transition::Certified,
    }
}

/// Owns one user's pass through the three steps.
#[derive(Debug, Clone)]
pub struct Attempt {
    id: AttemptId,
    state: AttemptState,
    latest: AttemptResult,
    policy: RetakePolicy,
    history: Vec<StepOutcome>,
}

impl Attempt {
    #[must_use]
    pub fn new(policy: RetakePolicy) -> Self {
        Self {
            id: AttemptId::generate(),
            state: AttemptState::InStep(Step::One),
            latest: AttemptResult::default(),
            policy,
            history: Vec::new(),
        }
    }

    /// Start from a result already stored on the competency record.
    ///
    /// A prior no-retake result makes the attempt terminal immediately.
    #[must_use]
    pub fn resume(policy: RetakePolicy, prior: Option<PriorResult>) -> Self {
        let mut attempt = Self::new(policy);
        if let Some(prior) = prior {
            attempt.latest = AttemptResult {
                score: Score::from_percent(prior.score).unwrap_or_default(),
                certified: prior.certified,
                no_retake: prior.no_retake,
            };
            if prior.no_retake {
                attempt.state = AttemptState::Failed;
            }
        }
        attempt
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> AttemptState {
        self.state
    }

    #[must_use]
    pub fn current_step(&self) -> Option<Step> {
        match self.state {
            AttemptState::InStep(step) => Some(step),
            _ => None,
        }
    }

    #[must_use]
    pub fn latest(&self) -> AttemptResult {
        self.latest
    }

    #[must_use]
    pub fn policy(&self) -> RetakePolicy {
        self.policy
    }

    #[must_use]
    pub fn history(&self) -> &[StepOutcome] {
        &self.history
    }

    /// Highest step number that produced an outcome (0 before any).
    #[must_use]
    pub fn steps_completed(&self) -> u8 {
        self.history
            .iter()
            .map(|outcome| outcome.step.number())
            .max()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Apply a finished step's outcome.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Terminal` once the attempt has ended and
    /// `AttemptError::StepMismatch` for an outcome from another step.
    pub fn apply(&mut self, outcome: StepOutcome) -> Result<Transition, AttemptError> {
        let AttemptState::InStep(step) = self.state else {
            return Err(AttemptError::Terminal);
        };
        if outcome.step != step {
            return Err(AttemptError::StepMismatch {
                expected: step,
                got: outcome.step,
            });
        }

        let next = transition(step, &outcome, self.policy);
        self.latest = outcome.into();
        self.history.push(outcome);
        self.state = next.state();
        Ok(next)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
