use std::sync::Arc;

use certify_core::model::{Assessment, SessionRecord, UserId};
use certify_core::{Clock, EmptyStepPolicy, RetakePolicy, TimerGeneration};
use storage::repository::{AttemptLogRepository, StorageError};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use super::flow::{AttemptFlow, FlowEvent};
use crate::assessment_service::AssessmentService;
use crate::error::{AttemptFlowError, SessionServiceError};
use crate::session_service::SessionService;

/// Starts attempts, feeds them questions and reports their results.
#[derive(Clone)]
pub struct AttemptService {
    clock: Clock,
    assessments: AssessmentService,
    sessions: SessionService,
    attempt_log: Arc<dyn AttemptLogRepository>,
    retake: RetakePolicy,
    empty_step: EmptyStepPolicy,
    runtime: Option<Handle>,
}

impl AttemptService {
    /// Countdowns run on the current tokio runtime, if any; see
    /// [`AttemptService::with_runtime`].
    #[must_use]
    pub fn new(
        clock: Clock,
        assessments: AssessmentService,
        sessions: SessionService,
        attempt_log: Arc<dyn AttemptLogRepository>,
    ) -> Self {
        Self {
            clock,
            assessments,
            sessions,
            attempt_log,
            retake: RetakePolicy::default(),
            empty_step: EmptyStepPolicy::default(),
            runtime: Handle::try_current().ok(),
        }
    }

    #[must_use]
    pub fn with_policies(mut self, retake: RetakePolicy, empty_step: EmptyStepPolicy) -> Self {
        self.retake = retake;
        self.empty_step = empty_step;
        self
    }

    #[must_use]
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Start an attempt on `assessment`, resuming from its stored result.
    #[must_use]
    pub fn begin(&self, assessment: &Assessment) -> (AttemptFlow, UnboundedReceiver<TimerGeneration>) {
        let started = AttemptFlow::start(
            self.retake,
            self.empty_step,
            assessment.prior(),
            self.clock.now(),
            self.runtime.clone(),
        );
        info!(
            attempt = %started.0.attempt().id(),
            assessment = %assessment.id(),
            state = ?started.0.state(),
            "attempt started"
        );
        started
    }

    /// Fetch and install the questions for the flow's active step.
    ///
    /// # Errors
    ///
    /// Returns `AttemptFlowError::Ended` once the attempt is over.
    pub async fn load_current_step(&self, flow: &mut AttemptFlow) -> Result<FlowEvent, AttemptFlowError> {
        let step = flow.current_step().ok_or(AttemptFlowError::Ended)?;
        let questions = self.assessments.questions_for_step(step).await;
        flow.load(questions)
    }

    /// Record for a finished flow, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `AttemptFlowError::Record` if the clock went backwards.
    pub fn finish(
        &self,
        flow: &AttemptFlow,
        assessment: &Assessment,
        user: Option<UserId>,
    ) -> Result<Option<SessionRecord>, AttemptFlowError> {
        flow.session_record(assessment.id().clone(), user, self.clock.now())
    }

    /// Send the result upstream and keep a local copy.
    ///
    /// Neither failure is surfaced to the user; both are logged. The local
    /// entry carries the remote id when the upstream call succeeded.
    pub async fn report(&self, record: SessionRecord) -> SessionRecord {
        let record = match self.sessions.submit(record.clone()).await {
            Ok(reported) => reported,
            Err(err) => {
                warn!(attempt = %record.attempt_id(), %err, "session report failed");
                record
            }
        };
        match self.attempt_log.append_attempt(&record).await {
            Ok(()) | Err(StorageError::Conflict) => {}
            Err(err) => warn!(attempt = %record.attempt_id(), %err, "attempt log write failed"),
        }
        record
    }

    /// Locally logged attempts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if the log cannot be read.
    pub async fn history(&self, limit: u32) -> Result<Vec<SessionRecord>, SessionServiceError> {
        Ok(self.attempt_log.list_attempts(limit).await?)
    }
}
