use std::sync::Arc;

use certify_core::model::{Assessment, OptionId, SessionRecord, UserId};
use certify_core::{AttemptResult, AttemptState, StepStatus};
use services::{AttemptFlow, AttemptService};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

pub const LOADING_QUESTIONS: &str = "Loading questions...";
pub const NO_QUESTIONS: &str = "NO QUESTIONS AVAILABLE!!!";
pub const CERTIFICATION_TITLE: &str = "Certification Result";

/// User input forwarded to the running attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptCommand {
    Select(OptionId),
    Next,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionVm {
    pub id: OptionId,
    pub text: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionVm {
    pub title: String,
    pub prompt: String,
    pub options: Vec<OptionVm>,
    pub time_left: String,
    pub next_label: &'static str,
    pub can_advance: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificationVm {
    pub score_label: String,
    pub level_label: String,
}

impl From<AttemptResult> for CertificationVm {
    fn from(result: AttemptResult) -> Self {
        Self {
            score_label: format!("Your Score: {:.2}%", result.score.percent()),
            level_label: format!("Certified Level: {}", result.certified),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptScreen {
    Loading { title: String },
    Empty { title: String },
    Question(QuestionVm),
    Failed { message: String },
    Certified(CertificationVm),
}

fn step_title(number: u8) -> String {
    format!("Step {number} Test")
}

#[must_use]
pub fn failure_message(step: u8) -> String {
    format!("Test Failed at Step {step} — No Retake Allowed.")
}

/// What the assessment page shows for `flow` right now.
#[must_use]
pub fn attempt_screen(flow: &AttemptFlow) -> AttemptScreen {
    match flow.state() {
        AttemptState::Failed => {
            let step = flow
                .attempt()
                .history()
                .last()
                .map_or(1, |outcome| outcome.step.number());
            AttemptScreen::Failed {
                message: failure_message(step),
            }
        }
        AttemptState::Certified => AttemptScreen::Certified(flow.latest().into()),
        AttemptState::InStep(step) => {
            let runner = flow.runner();
            let title = step_title(step.number());
            match (runner.status(), runner.current_question()) {
                (StepStatus::Answering, Some(question)) => {
                    let options = question
                        .options()
                        .iter()
                        .map(|option| OptionVm {
                            id: option.id().clone(),
                            text: option.text().to_string(),
                            selected: runner.is_selected(option.id()),
                        })
                        .collect();
                    AttemptScreen::Question(QuestionVm {
                        title,
                        prompt: question.prompt().to_string(),
                        options,
                        time_left: format!("Time left: {}s", runner.remaining_secs()),
                        next_label: if runner.is_last_question() {
                            "Finish Test"
                        } else {
                            "Next Question"
                        },
                        can_advance: runner.can_advance(),
                    })
                }
                (StepStatus::Empty, _) => AttemptScreen::Empty { title },
                _ => AttemptScreen::Loading { title },
            }
        }
    }
}

/// Drive one attempt until it ends or the command channel closes.
///
/// Every state change is passed to `publish`. Returns the reported record
/// when the attempt ended with at least one finished step.
pub async fn run_attempt(
    attempts: Arc<AttemptService>,
    assessment: Assessment,
    user: Option<UserId>,
    mut commands: UnboundedReceiver<AttemptCommand>,
    mut publish: impl FnMut(AttemptScreen),
) -> Option<SessionRecord> {
    let (mut flow, mut ticks) = attempts.begin(&assessment);

    while !flow.is_terminal() {
        publish(attempt_screen(&flow));

        if flow.needs_questions() {
            if let Err(err) = attempts.load_current_step(&mut flow).await {
                warn!(%err, "could not load step questions");
            }
            continue;
        }

        tokio::select! {
            tick = ticks.recv() => {
                let Some(generation) = tick else { break };
                if let Err(err) = flow.on_tick(generation) {
                    warn!(%err, "tick rejected");
                }
            }
            command = commands.recv() => {
                let result = match command {
                    Some(AttemptCommand::Select(option)) => flow.select(option),
                    Some(AttemptCommand::Next) => flow.next().map(|_| ()),
                    None => {
                        debug!("assessment view closed; abandoning attempt");
                        flow.cancel();
                        return None;
                    }
                };
                if let Err(err) = result {
                    debug!(%err, "command ignored");
                }
            }
        }
    }

    publish(attempt_screen(&flow));
    let record = match attempts.finish(&flow, &assessment, user) {
        Ok(record) => record?,
        Err(err) => {
            warn!(%err, "could not build session record");
            return None;
        }
    };
    Some(attempts.report(record).await)
}
