use std::sync::Arc;

use certify_core::forms::LoginForm;
use certify_core::model::Role;
use certify_core::time::fixed_now;
use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use services::{AppConfig, AppServices, Clock};
use storage::memory::InMemoryRepository;
use storage::repository::{NewUser, Storage};

use crate::context::{UiApp, build_app_context, use_auth_provider};
use crate::views::{
    AssessmentView, DashboardView, HomeView, LoginView, RegisterView, UnauthorizedView,
};

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Home,
    Login,
    Register,
    Assessment,
    Dashboard,
    Unauthorized,
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<AppServices>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ViewHarnessProps {}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    let ctx = use_context_provider(|| build_app_context(&app));
    use_auth_provider(ctx.auth());
    use_context_provider(|| props.view);
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
    #[route("/:..segments")]
    Elsewhere { segments: Vec<String> },
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Home => rsx! { HomeView {} },
        ViewKind::Login => rsx! { LoginView {} },
        ViewKind::Register => rsx! { RegisterView {} },
        ViewKind::Assessment => rsx! { AssessmentView {} },
        ViewKind::Dashboard => rsx! { DashboardView {} },
        ViewKind::Unauthorized => rsx! { UnauthorizedView {} },
    }
}

/// Where a view navigated to; the real routes are not mounted here.
#[component]
fn Elsewhere(segments: Vec<String>) -> Element {
    let path = segments.join("/");
    rsx! {
        p { "Redirected to /{path}" }
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub repo: InMemoryRepository,
    pub services: Arc<AppServices>,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Rebuild, then let resources and effects settle.
    pub async fn settle(&mut self) {
        self.rebuild();
        for _ in 0..4 {
            self.drive_async().await;
        }
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub const PASSWORD: &str = "secret1";

/// Build the harness over `repo`, signed in as `role` when given.
pub async fn setup_view_harness(
    view: ViewKind,
    repo: InMemoryRepository,
    role: Option<Role>,
) -> ViewHarness {
    let services = Arc::new(AppServices::from_storage(
        Storage::from_memory(&repo),
        AppConfig::default(),
        Clock::fixed(fixed_now()),
    ));

    if let Some(role) = role {
        let email = format!("{role}@example.com");
        repo.insert_account(&NewUser {
            name: format!("Test {role}"),
            email: email.clone(),
            password: PASSWORD.into(),
            role,
        })
        .expect("insert account");
        services
            .auth()
            .login(&LoginForm {
                email,
                password: PASSWORD.into(),
            })
            .await
            .expect("login");
    }

    let dom = VirtualDom::new_with_props(
        ViewRouterHarness,
        ViewHarnessProps {
            app: Arc::clone(&services),
            view,
        },
    );

    ViewHarness {
        dom,
        repo,
        services,
    }
}
