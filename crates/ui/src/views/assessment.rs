use certify_core::model::Assessment;
use dioxus::prelude::*;
use services::guard::Access;
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::context::{AppContext, AuthUi};
use crate::views::guard::Guarded;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{
    AttemptCommand, AttemptScreen, CERTIFICATION_TITLE, CertificationVm, LOADING_QUESTIONS,
    NO_QUESTIONS, OptionVm, QuestionVm, SessionRowVm, run_attempt,
};

const RECENT_ATTEMPTS: u32 = 5;

#[component]
pub fn AssessmentView() -> Element {
    rsx! {
        Guarded { access: Access::Private, path: "/assessment".to_string(),
            CompetencyPicker {}
        }
    }
}

#[component]
fn CompetencyPicker() -> Element {
    let ctx = use_context::<AppContext>();
    let assessments = ctx.assessments();
    let attempts = ctx.attempts();
    let mut selected = use_signal(|| None::<Assessment>);

    let mut resource = use_resource(move || {
        let assessments = assessments.clone();
        async move {
            let list = assessments
                .list(false)
                .await
                .map_err(|_| ViewError::Unavailable)?;
            Ok::<_, ViewError>(list.as_ref().clone())
        }
    });
    let state = view_state_from_resource(resource);

    let mut history = use_resource(move || {
        let attempts = attempts.clone();
        async move {
            match attempts.history(RECENT_ATTEMPTS).await {
                Ok(records) => records.iter().map(SessionRowVm::from).collect::<Vec<_>>(),
                Err(err) => {
                    tracing::warn!(%err, "attempt history unavailable");
                    Vec::new()
                }
            }
        }
    });
    let recent = history.read().clone().unwrap_or_default();

    let on_done = use_callback(move |()| {
        selected.set(None);
        resource.restart();
        history.restart();
    });

    if let Some(assessment) = selected.read().clone() {
        return rsx! {
            AttemptPanel {
                key: "{assessment.id()}",
                assessment: assessment.clone(),
                on_done,
            }
        };
    }

    rsx! {
        div { class: "page assessment",
            h2 { "Choose a competency" }
            match state {
                ViewState::Idle | ViewState::Loading => rsx! {
                    p { class: "loading", "Loading..." }
                },
                ViewState::Ready(list) => rsx! {
                    if list.is_empty() {
                        p { "No competencies available yet." }
                    } else {
                        div { class: "cards",
                            for assessment in list {
                                CompetencyCard {
                                    key: "{assessment.id()}",
                                    assessment: assessment.clone(),
                                    on_pick: move |picked| selected.set(Some(picked)),
                                }
                            }
                        }
                    }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "error", "{err.message()}" }
                    button { onclick: move |_| resource.restart(), "Retry" }
                },
            }
            if !recent.is_empty() {
                RecentAttempts { rows: recent }
            }
        }
    }
}

#[component]
fn RecentAttempts(rows: Vec<SessionRowVm>) -> Element {
    rsx! {
        section { class: "recent-attempts",
            h3 { "Recent attempts" }
            ul {
                for (i, row) in rows.into_iter().enumerate() {
                    li { key: "{i}",
                        span { class: "when", "{row.completed_at}" }
                        span { class: "level", "{row.certified}" }
                        span { class: "score", "{row.score}" }
                    }
                }
            }
        }
    }
}

#[component]
fn CompetencyCard(assessment: Assessment, on_pick: EventHandler<Assessment>) -> Element {
    let prior = assessment.prior();
    let id = format!("competency-{}", assessment.id());
    let picked = assessment.clone();

    rsx! {
        button {
            id: "{id}",
            class: "card competency",
            onclick: move |_| on_pick.call(picked.clone()),
            h3 { "{assessment.name()}" }
            p { "{assessment.description()}" }
            if let Some(prior) = prior {
                p { class: "prior", "Last result: {prior.certified}" }
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
struct Commands(Signal<Option<UnboundedSender<AttemptCommand>>>);

impl Commands {
    fn send(self, command: AttemptCommand) {
        if let Some(tx) = self.0.read().as_ref() {
            let _ = tx.send(command);
        }
    }
}

#[component]
fn AttemptPanel(assessment: Assessment, on_done: EventHandler<()>) -> Element {
    let ctx = use_context::<AppContext>();
    let auth_ui = use_context::<AuthUi>();
    let screen = use_signal(|| AttemptScreen::Loading {
        title: "Step 1 Test".to_string(),
    });
    let sender = use_signal(|| None::<UnboundedSender<AttemptCommand>>);
    let commands = Commands(sender);

    let name = assessment.name().to_string();
    use_future(move || {
        let attempts = ctx.attempts();
        let assessment = assessment.clone();
        let user = auth_ui.snapshot.peek().user.as_ref().map(|user| user.id.clone());
        let mut screen = screen;
        let mut sender = sender;
        async move {
            let (tx, rx) = mpsc::unbounded_channel();
            sender.set(Some(tx));
            let record = run_attempt(attempts, assessment, user, rx, move |next| {
                screen.set(next);
            })
            .await;
            sender.set(None);
            if let Some(record) = record {
                tracing::debug!(attempt = %record.attempt_id(), "attempt reported");
            }
        }
    });

    let current = screen.read().clone();

    rsx! {
        div { class: "page attempt",
            p { class: "competency-name", "{name}" }
            match current {
                AttemptScreen::Loading { title } => rsx! {
                    h2 { "{title}" }
                    p { class: "loading", "{LOADING_QUESTIONS}" }
                },
                AttemptScreen::Empty { title } => rsx! {
                    h2 { "{title}" }
                    p { class: "empty", "{NO_QUESTIONS}" }
                },
                AttemptScreen::Question(question) => rsx! {
                    QuestionCard { question, commands }
                },
                AttemptScreen::Failed { message } => rsx! {
                    div { class: "result failed",
                        h2 { "{message}" }
                        button { id: "attempt-done", onclick: move |_| on_done.call(()), "Back to competencies" }
                    }
                },
                AttemptScreen::Certified(result) => rsx! {
                    CertificationCard { result, on_done }
                },
            }
        }
    }
}

#[component]
fn QuestionCard(question: QuestionVm, commands: Commands) -> Element {
    let next_disabled = !question.can_advance;

    rsx! {
        div { class: "question",
            div { class: "question-header",
                h2 { "{question.title}" }
                span { class: "timer", "{question.time_left}" }
            }
            p { class: "prompt", "{question.prompt}" }
            ul { class: "options",
                for option in question.options {
                    OptionRow { key: "{option.id}", option: option.clone(), commands }
                }
            }
            button {
                id: "attempt-next",
                class: "primary",
                disabled: next_disabled,
                onclick: move |_| commands.send(AttemptCommand::Next),
                "{question.next_label}"
            }
        }
    }
}

#[component]
fn OptionRow(option: OptionVm, commands: Commands) -> Element {
    let id = option.id.clone();
    let class = if option.selected { "option selected" } else { "option" };

    rsx! {
        li {
            label { class,
                input {
                    r#type: "radio",
                    name: "answer",
                    checked: option.selected,
                    onchange: move |_| commands.send(AttemptCommand::Select(id.clone())),
                }
                "{option.text}"
            }
        }
    }
}

#[component]
fn CertificationCard(result: CertificationVm, on_done: EventHandler<()>) -> Element {
    rsx! {
        div { class: "result certified",
            h2 { "{CERTIFICATION_TITLE}" }
            p { class: "score", "{result.score_label}" }
            p { class: "level", "{result.level_label}" }
            button { id: "attempt-done", onclick: move |_| on_done.call(()), "Back to competencies" }
        }
    }
}
