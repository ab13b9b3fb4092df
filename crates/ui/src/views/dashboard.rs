use std::str::FromStr;

use certify_core::forms::{Field, UserForm};
use certify_core::model::{Level, QuestionId, Role, SessionId, UserId};
use dioxus::prelude::*;
use services::guard::{Access, STAFF_ROLES};
use services::{QuestionServiceError, UserServiceError, search_questions};

use crate::context::AppContext;
use crate::views::guard::Guarded;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{
    BarVm, DashboardVm, QuestionFormVm, QuestionRowVm, SessionRowVm, UserRowVm,
    question_error_message,
};

#[component]
pub fn DashboardView() -> Element {
    rsx! {
        Guarded { access: Access::Roles(&STAFF_ROLES), path: "/dashboard".to_string(),
            DashboardPage {}
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Listings {
    questions: Vec<storage::repository::QuestionRecord>,
    sessions: Vec<SessionRowVm>,
    users: Vec<UserRowVm>,
}

#[component]
fn DashboardPage() -> Element {
    let ctx = use_context::<AppContext>();
    let mut version = use_signal(|| 0_u32);

    let stats_resource = {
        let dashboard = ctx.dashboard();
        use_resource(move || {
            let dashboard = dashboard.clone();
            let force = version() > 0;
            async move {
                let stats = dashboard
                    .stats(force)
                    .await
                    .map_err(|_| ViewError::Unavailable)?;
                Ok::<_, ViewError>(DashboardVm::from(&stats))
            }
        })
    };
    let listings_resource = {
        let questions = ctx.questions();
        let sessions = ctx.sessions();
        let users = ctx.users();
        use_resource(move || {
            let questions = questions.clone();
            let sessions = sessions.clone();
            let users = users.clone();
            let force = version() > 0;
            async move {
                let question_list = questions
                    .list(force)
                    .await
                    .map_err(|_| ViewError::Unavailable)?;
                let session_list = sessions
                    .list(force)
                    .await
                    .map_err(|_| ViewError::Unavailable)?;
                let user_list = users
                    .list(force)
                    .await
                    .map_err(|_| ViewError::Unavailable)?;
                Ok::<_, ViewError>(Listings {
                    questions: question_list.as_ref().clone(),
                    sessions: session_list.iter().map(SessionRowVm::from).collect(),
                    users: user_list.iter().map(UserRowVm::from).collect(),
                })
            }
        })
    };

    // Bumping the version re-runs both resources with a forced refetch.
    let on_changed = use_callback(move |()| version += 1);

    let stats = view_state_from_resource(stats_resource);
    let listings = view_state_from_resource(listings_resource);

    rsx! {
        div { class: "page dashboard",
            div { class: "page-header",
                h2 { "Dashboard" }
                button { id: "dashboard-refresh", onclick: move |_| on_changed.call(()), "Refresh" }
            }
            match stats {
                ViewState::Idle | ViewState::Loading => rsx! {
                    p { class: "loading", "Loading..." }
                },
                ViewState::Ready(vm) => rsx! { StatsPanel { vm } },
                ViewState::Error(err) => rsx! {
                    p { class: "error", "{err.message()}" }
                },
            }
            match listings {
                ViewState::Idle | ViewState::Loading => rsx! {},
                ViewState::Ready(data) => rsx! {
                    QuestionsPanel { records: data.questions, on_changed }
                    SessionsPanel { rows: data.sessions, on_changed }
                    UsersPanel { rows: data.users, on_changed }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "error", "{err.message()}" }
                },
            }
        }
    }
}

#[component]
fn StatsPanel(vm: DashboardVm) -> Element {
    rsx! {
        section { class: "stats",
            div { class: "totals",
                for (label, value) in vm.totals {
                    div { class: "total", key: "{label}",
                        span { class: "total-label", "{label}" }
                        span { class: "total-value", "{value}" }
                    }
                }
            }
            h3 { "Certified levels" }
            BarChart { bars: vm.certified_bars }
            h3 { "Questions per level" }
            BarChart { bars: vm.level_bars }
        }
    }
}

#[component]
fn BarChart(bars: Vec<BarVm>) -> Element {
    rsx! {
        ul { class: "bars",
            for bar in bars {
                li { class: "bar", key: "{bar.label}",
                    span { class: "bar-label", "{bar.label}" }
                    span { class: "bar-fill", style: "width: {bar.width_pct}%" }
                    span { class: "bar-count", "{bar.count}" }
                }
            }
        }
    }
}

#[component]
fn QuestionsPanel(
    records: Vec<storage::repository::QuestionRecord>,
    on_changed: EventHandler<()>,
) -> Element {
    let ctx = use_context::<AppContext>();
    let mut query = use_signal(String::new);
    let mut error = use_signal(|| None::<&'static str>);

    let rows: Vec<QuestionRowVm> = search_questions(&records, &query.read())
        .into_iter()
        .map(QuestionRowVm::from)
        .collect();

    let on_delete = use_callback(move |id: String| {
        let questions = ctx.questions();
        spawn(async move {
            match questions.remove(&QuestionId::new(id)).await {
                Ok(()) => {
                    error.set(None);
                    on_changed.call(());
                }
                Err(err) => {
                    tracing::warn!(%err, "question delete failed");
                    error.set(Some("Could not delete the question"));
                }
            }
        });
    });

    rsx! {
        section { class: "questions",
            h3 { "Questions" }
            input {
                id: "question-search",
                r#type: "search",
                placeholder: "Search questions",
                value: "{query}",
                oninput: move |evt| query.set(evt.value()),
            }
            if let Some(message) = error() {
                p { class: "error", "{message}" }
            }
            table {
                thead {
                    tr {
                        th { "Question" }
                        th { "Level" }
                        th { "Options" }
                        th { "Correct" }
                        th {}
                    }
                }
                tbody {
                    for row in rows {
                        QuestionRow { key: "{row.id}", row: row.clone(), on_delete }
                    }
                }
            }
            NewQuestionForm { on_changed }
        }
    }
}

#[component]
fn QuestionRow(row: QuestionRowVm, on_delete: EventHandler<String>) -> Element {
    let id = row.id.clone();

    rsx! {
        tr {
            td { "{row.prompt}" }
            td { "{row.level}" }
            td { "{row.options}" }
            td { "{row.correct}" }
            td {
                button { class: "danger", onclick: move |_| on_delete.call(id.clone()), "Delete" }
            }
        }
    }
}

#[component]
fn NewQuestionForm(on_changed: EventHandler<()>) -> Element {
    let ctx = use_context::<AppContext>();
    let mut form = use_signal(QuestionFormVm::default);
    let mut error = use_signal(|| None::<&'static str>);

    let on_submit = use_callback(move |()| {
        let draft = match form.read().to_draft() {
            Ok(draft) => draft,
            Err(message) => {
                error.set(Some(message));
                return;
            }
        };
        let questions = ctx.questions();
        spawn(async move {
            match questions.create(draft).await {
                Ok(_) => {
                    error.set(None);
                    form.set(QuestionFormVm::default());
                    on_changed.call(());
                }
                Err(QuestionServiceError::Question(err)) => {
                    error.set(Some(question_error_message(&err)));
                }
                Err(err) => {
                    tracing::warn!(%err, "question create failed");
                    error.set(Some("Could not save the question"));
                }
            }
        });
    });

    let current = form.read().clone();

    rsx! {
        form { class: "new-question",
            onsubmit: move |evt| {
                evt.prevent_default();
                on_submit.call(());
            },
            h4 { "New question" }
            select {
                id: "question-level",
                value: "{current.level}",
                onchange: move |evt| {
                    if let Ok(level) = Level::from_str(&evt.value()) {
                        form.write().level = level;
                    }
                },
                for level in Level::ALL {
                    option { value: "{level}", "{level}" }
                }
            }
            input {
                id: "question-prompt",
                placeholder: "Question text",
                value: "{current.prompt}",
                oninput: move |evt| form.write().prompt = evt.value(),
            }
            for (slot, text) in current.options.iter().cloned().enumerate() {
                div { class: "option-slot", key: "{slot}",
                    input {
                        r#type: "radio",
                        name: "question-correct",
                        checked: current.correct == slot,
                        onchange: move |_| form.write().correct = slot,
                    }
                    input {
                        placeholder: format!("Option {}", slot + 1),
                        value: text,
                        oninput: move |evt| form.write().options[slot] = evt.value(),
                    }
                }
            }
            input {
                id: "question-time-limit",
                placeholder: "Time limit (seconds)",
                value: "{current.time_limit}",
                oninput: move |evt| form.write().time_limit = evt.value(),
            }
            if let Some(message) = error() {
                p { class: "error", "{message}" }
            }
            button { class: "primary", r#type: "submit", "Add question" }
        }
    }
}

#[component]
fn SessionsPanel(rows: Vec<SessionRowVm>, on_changed: EventHandler<()>) -> Element {
    let ctx = use_context::<AppContext>();
    let mut error = use_signal(|| None::<&'static str>);

    let on_delete = use_callback(move |id: String| {
        let sessions = ctx.sessions();
        spawn(async move {
            match sessions.delete(&SessionId::new(id)).await {
                Ok(()) => {
                    error.set(None);
                    on_changed.call(());
                }
                Err(err) => {
                    tracing::warn!(%err, "session delete failed");
                    error.set(Some("Could not delete the session"));
                }
            }
        });
    });

    rsx! {
        section { class: "sessions",
            h3 { "Sessions" }
            if let Some(message) = error() {
                p { class: "error", "{message}" }
            }
            if rows.is_empty() {
                p { "No sessions yet." }
            } else {
                table {
                    thead {
                        tr {
                            th { "Completed" }
                            th { "Score" }
                            th { "Level" }
                            th { "Steps" }
                            th {}
                        }
                    }
                    tbody {
                        for row in rows {
                            SessionRow { row, on_delete }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn SessionRow(row: SessionRowVm, on_delete: EventHandler<String>) -> Element {
    let id = row.id.clone();

    rsx! {
        tr {
            td { "{row.completed_at}" }
            td { "{row.score}" }
            td { "{row.certified}" }
            td { "{row.steps}" }
            td {
                if let Some(id) = id {
                    button { class: "danger", onclick: move |_| on_delete.call(id.clone()), "Delete" }
                } else {
                    span { class: "muted", "local" }
                }
            }
        }
    }
}

#[component]
fn UsersPanel(rows: Vec<UserRowVm>, on_changed: EventHandler<()>) -> Element {
    let ctx = use_context::<AppContext>();
    let mut error = use_signal(|| None::<&'static str>);

    let on_delete = use_callback(move |id: String| {
        let users = ctx.users();
        spawn(async move {
            match users.delete(&UserId::new(id)).await {
                Ok(()) => {
                    error.set(None);
                    on_changed.call(());
                }
                Err(err) => {
                    tracing::warn!(%err, "user delete failed");
                    error.set(Some("Could not delete the user"));
                }
            }
        });
    });

    rsx! {
        section { class: "users",
            h3 { "Users" }
            if let Some(message) = error() {
                p { class: "error", "{message}" }
            }
            table {
                thead {
                    tr {
                        th { "Name" }
                        th { "Email" }
                        th { "Role" }
                        th {}
                    }
                }
                tbody {
                    for row in rows {
                        UserRow { key: "{row.id}", row: row.clone(), on_delete }
                    }
                }
            }
            NewUserForm { on_changed }
        }
    }
}

#[component]
fn UserRow(row: UserRowVm, on_delete: EventHandler<String>) -> Element {
    let id = row.id.clone();

    rsx! {
        tr {
            td { "{row.name}" }
            td { "{row.email}" }
            td { "{row.role}" }
            td {
                button { class: "danger", onclick: move |_| on_delete.call(id.clone()), "Delete" }
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct UserFormErrors {
    name: Option<&'static str>,
    email: Option<&'static str>,
    password: Option<&'static str>,
    banner: Option<&'static str>,
}

#[component]
fn NewUserForm(on_changed: EventHandler<()>) -> Element {
    let ctx = use_context::<AppContext>();
    let mut name = use_signal(String::new);
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut role = use_signal(|| Role::User);
    let mut errors = use_signal(UserFormErrors::default);

    let on_submit = use_callback(move |()| {
        let form = UserForm {
            name: name(),
            email: email(),
            password: password(),
            role: role(),
        };
        let users = ctx.users();
        spawn(async move {
            match users.create(&form).await {
                Ok(_) => {
                    errors.set(UserFormErrors::default());
                    name.set(String::new());
                    email.set(String::new());
                    password.set(String::new());
                    on_changed.call(());
                }
                Err(UserServiceError::InvalidForm(invalid)) => errors.set(UserFormErrors {
                    name: invalid.get(Field::Name),
                    email: invalid.get(Field::Email),
                    password: invalid.get(Field::Password),
                    banner: None,
                }),
                Err(err) => {
                    tracing::warn!(%err, "user create failed");
                    errors.set(UserFormErrors {
                        banner: Some("Could not create the user"),
                        ..UserFormErrors::default()
                    });
                }
            }
        });
    });

    let current = errors.read().clone();
    let role_value = role.read().to_string();

    rsx! {
        form { class: "new-user",
            onsubmit: move |evt| {
                evt.prevent_default();
                on_submit.call(());
            },
            h4 { "New user" }
            if let Some(message) = current.banner {
                p { class: "error", "{message}" }
            }
            input {
                id: "user-name",
                placeholder: "Name",
                value: "{name}",
                oninput: move |evt| name.set(evt.value()),
            }
            if let Some(message) = current.name {
                p { class: "error", "{message}" }
            }
            input {
                id: "user-email",
                r#type: "email",
                placeholder: "Email",
                value: "{email}",
                oninput: move |evt| email.set(evt.value()),
            }
            if let Some(message) = current.email {
                p { class: "error", "{message}" }
            }
            input {
                id: "user-password",
                r#type: "password",
                placeholder: "Password",
                value: "{password}",
                oninput: move |evt| password.set(evt.value()),
            }
            if let Some(message) = current.password {
                p { class: "error", "{message}" }
            }
            select {
                id: "user-role",
                value: "{role_value}",
                onchange: move |evt| role.set(Role::parse(&evt.value())),
                option { value: "user", "User" }
                option { value: "supervisor", "Supervisor" }
                option { value: "admin", "Admin" }
            }
            button { class: "primary", r#type: "submit", "Add user" }
        }
    }
}
