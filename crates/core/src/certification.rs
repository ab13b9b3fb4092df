//! Per-step certification rules.
//!
//! The table below is reproduced as-is, including the repeated upper bands
//! (step 1 and 2 certify the same label for `50..75` and `>= 75`; step 3
//! has no separate top band).
//!
//! | step | `< 25`            | `25..50` | `50..75` | `>= 75` |
//! |------|-------------------|----------|----------|---------|
//! | 1    | `fail`, no retake | A1       | A2       | A2      |
//! | 2    | A2                | B1       | B2       | B2      |
//! | 3    | B2                | C1       | C2       | C2      |

use std::fmt;
use thiserror::Error;

use crate::model::{CertifiedLevel, Level};
use crate::scoring::Score;

/// Score needed at steps 1 and 2 to move on to the next step.
pub const ADVANCE_THRESHOLD: f64 = 75.0;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("step must be 1, 2 or 3, got {0}")]
pub struct InvalidStep(pub u8);

/// One of the three sequential test phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    One,
    Two,
    Three,
}

impl Step {
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Step::One => 1,
            Step::Two => 2,
            Step::Three => 3,
        }
    }

    /// Levels covered by this step, lower first.
    #[must_use]
    pub fn levels(self) -> (Level, Level) {
        match self {
            Step::One => (Level::A1, Level::A2),
            Step::Two => (Level::B1, Level::B2),
            Step::Three => (Level::C1, Level::C2),
        }
    }

    /// The level whose questions are fetched for this step.
    #[must_use]
    pub fn primary_level(self) -> Level {
        self.levels().0
    }

    #[must_use]
    pub fn next(self) -> Option<Step> {
        match self {
            Step::One => Some(Step::Two),
            Step::Two => Some(Step::Three),
            Step::Three => None,
        }
    }

    #[must_use]
    pub fn is_last(self) -> bool {
        self.next().is_none()
    }
}

impl TryFrom<u8> for Step {
    type Error = InvalidStep;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Step::One),
            2 => Ok(Step::Two),
            3 => Ok(Step::Three),
            other => Err(InvalidStep(other)),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// What a finished step reports to the progression controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub step: Step,
    pub score: Score,
    pub certified: CertifiedLevel,
    pub no_retake: bool,
}

impl StepOutcome {
    #[must_use]
    pub fn meets_advance_threshold(&self) -> bool {
        self.score.percent() >= ADVANCE_THRESHOLD
    }
}

/// Map a step score to its certified level and retake flag.
#[must_use]
pub fn certify(step: Step, score: Score) -> StepOutcome {
    let s = score.percent();
    let (certified, no_retake) = match step {
        Step::One => {
            if s < 25.0 {
                (CertifiedLevel::Fail, true)
            } else if s < 50.0 {
                (Level::A1.into(), false)
            } else {
                (Level::A2.into(), false)
            }
        }
        Step::Two => {
            if s < 25.0 {
                (Level::A2.into(), false)
            } else if s < 50.0 {
                (Level::B1.into(), false)
            } else {
                (Level::B2.into(), false)
            }
        }
        Step::Three => {
            if s < 25.0 {
                (Level::B2.into(), false)
            } else if s < 50.0 {
                (Level::C1.into(), false)
            } else {
                (Level::C2.into(), false)
            }
        }
    };

    StepOutcome {
        step,
        score,
        certified,
        no_retake,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(step: Step, percent: f64) -> StepOutcome {
        certify(step, Score::from_percent(percent).unwrap())
    }

    #[test]
    fn step_one_low_score_fails_without_retake() {
        let result = outcome(Step::One, 10.0);
        assert!(result.no_retake);
        assert_eq!(result.certified, CertifiedLevel::Fail);
    }

    #[test]
    fn step_one_bands() {
        let mid = outcome(Step::One, 40.0);
        assert_eq!(mid.certified, CertifiedLevel::Level(Level::A1));
        assert!(!mid.no_retake);
        assert_eq!(outcome(Step::One, 60.0).certified, Level::A2.into());
        assert_eq!(outcome(Step::One, 80.0).certified, Level::A2.into());
    }

    #[test]
    fn step_two_bands() {
        assert_eq!(outcome(Step::Two, 0.0).certified, Level::A2.into());
        assert_eq!(outcome(Step::Two, 25.0).certified, Level::B1.into());
        assert_eq!(outcome(Step::Two, 60.0).certified, Level::B2.into());
        assert_eq!(outcome(Step::Two, 100.0).certified, Level::B2.into());
        assert!(!outcome(Step::Two, 0.0).no_retake);
    }

    #[test]
    fn step_three_bands() {
        assert_eq!(outcome(Step::Three, 20.0).certified, Level::B2.into());
        assert_eq!(outcome(Step::Three, 30.0).certified, Level::C1.into());
        assert_eq!(outcome(Step::Three, 50.0).certified, Level::C2.into());
        assert_eq!(outcome(Step::Three, 90.0).certified, Level::C2.into());
    }

    #[test]
    fn band_edges_are_inclusive_on_the_low_side() {
        assert!(outcome(Step::One, 24.999).no_retake);
        assert!(!outcome(Step::One, 25.0).no_retake);
        assert_eq!(outcome(Step::One, 49.999).certified, Level::A1.into());
        assert_eq!(outcome(Step::One, 50.0).certified, Level::A2.into());
        assert!(!outcome(Step::Two, 74.999).meets_advance_threshold());
        assert!(outcome(Step::Two, 75.0).meets_advance_threshold());
    }

    #[test]
    fn step_metadata() {
        assert_eq!(Step::Two.primary_level(), Level::B1);
        assert_eq!(Step::One.next(), Some(Step::Two));
        assert!(Step::Three.is_last());
        assert_eq!(Step::try_from(3).unwrap(), Step::Three);
        assert_eq!(Step::try_from(4).unwrap_err(), InvalidStep(4));
    }
}
