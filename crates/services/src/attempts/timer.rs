use std::time::Duration;

use certify_core::TimerGeneration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::warn;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Repeating one-second tick source for the active question.
///
/// Each tick carries the generation it was armed with, so a tick that
/// arrives after the question changed is recognisably stale. At most one
/// task runs per timer; starting again aborts the previous one.
#[derive(Debug)]
pub struct StepTimer {
    runtime: Option<Handle>,
    ticks: UnboundedSender<TimerGeneration>,
    task: Option<JoinHandle<()>>,
}

impl StepTimer {
    /// Without a runtime the timer never fires and questions only advance
    /// manually.
    #[must_use]
    pub fn new(runtime: Option<Handle>, ticks: UnboundedSender<TimerGeneration>) -> Self {
        Self {
            runtime,
            ticks,
            task: None,
        }
    }

    pub fn start(&mut self, generation: TimerGeneration) {
        self.cancel();
        let Some(runtime) = self.runtime.as_ref() else {
            warn!("no async runtime; countdown disabled");
            return;
        };
        let ticks = self.ticks.clone();
        self.task = Some(runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if ticks.send(generation).is_err() {
                    break;
                }
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for StepTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
