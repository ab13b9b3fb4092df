//! Timed test-taking: one flow per attempt, ticking once per second.

mod flow;
mod service;
mod timer;

pub use flow::{AttemptFlow, FlowEvent};
pub use service::AttemptService;
pub use timer::{StepTimer, TICK_INTERVAL};
