use certify_core::model::Role;
use dioxus::prelude::*;
use dioxus_router::{Link, Outlet, Routable, use_navigator};
use services::Landing;

use crate::context::{AppContext, AuthUi};
use crate::views::{
    AssessmentView, DashboardView, HomeView, LoginView, RegisterView, UnauthorizedView,
};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", HomeView)] Home {},
        #[route("/login", LoginView)] Login {},
        #[route("/register", RegisterView)] Register {},
        #[route("/assessment", AssessmentView)] Assessment {},
        #[route("/dashboard", DashboardView)] Dashboard {},
        #[route("/unauthorized", UnauthorizedView)] Unauthorized {},
}

/// Page a signed-in user with `role` starts on.
#[must_use]
pub fn landing_route(role: &Role) -> Route {
    match Landing::for_role(role) {
        Landing::Dashboard => Route::Dashboard {},
        Landing::Assessment => Route::Assessment {},
    }
}

/// Route for a path remembered by a guard, if it is one of ours.
#[must_use]
pub fn route_for_path(path: &str) -> Option<Route> {
    path.parse::<Route>().ok()
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            NavBar {}
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn NavBar() -> Element {
    let ctx = use_context::<AppContext>();
    let auth_ui = use_context::<AuthUi>();
    let navigator = use_navigator();
    let snapshot = auth_ui.snapshot.read().clone();

    let on_logout = use_callback(move |()| {
        let auth = ctx.auth();
        spawn(async move {
            if let Err(err) = auth.logout().await {
                tracing::warn!(%err, "logout failed");
            }
            auth_ui.sync(&auth);
            navigator.replace(Route::Login {});
        });
    });

    rsx! {
        nav { class: "navbar",
            h1 { "Certify" }
            if let Some(user) = snapshot.user {
                ul {
                    li { Link { to: Route::Assessment {}, "Assessment" } }
                    if user.role.is_staff() {
                        li { Link { to: Route::Dashboard {}, "Dashboard" } }
                    }
                }
                div { class: "navbar-user",
                    span { "{user.name} ({user.role})" }
                    button {
                        id: "logout",
                        onclick: move |_| on_logout.call(()),
                        "Logout"
                    }
                }
            }
        }
    }
}
