#![forbid(unsafe_code)]

pub mod attempt;
pub mod certification;
pub mod countdown;
pub mod error;
pub mod forms;
pub mod ledger;
pub mod model;
pub mod scoring;
pub mod step;
pub mod time;

pub use attempt::{Attempt, AttemptError, AttemptResult, AttemptState, RetakePolicy, Transition};
pub use certification::{Step, StepOutcome, certify};
pub use countdown::{Countdown, Tick, TimerGeneration};
pub use error::Error;
pub use ledger::AnswerLedger;
pub use scoring::{Score, Tally};
pub use step::{Advance, EmptyStepPolicy, StepError, StepRunner, StepStatus, StepTick};
pub use time::Clock;
