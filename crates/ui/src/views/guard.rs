use dioxus::prelude::*;
use dioxus_router::use_navigator;
use services::guard::{Access, GuardDecision, check};

use crate::context::AuthUi;
use crate::routes::Route;

/// Renders `children` only when the signed-in user passes `access`.
#[component]
pub fn Guarded(access: Access, path: String, children: Element) -> Element {
    let auth_ui = use_context::<AuthUi>();
    let navigator = use_navigator();
    let decision = check(&auth_ui.snapshot.read(), access, &path);

    let effect_decision = decision.clone();
    use_effect(use_reactive!(|effect_decision| {
        let mut redirect = auth_ui.redirect;
        match effect_decision {
            GuardDecision::RedirectToLogin { from } => {
                redirect.set(Some(from));
                navigator.replace(Route::Login {});
            }
            GuardDecision::Unauthorized => {
                navigator.replace(Route::Unauthorized {});
            }
            GuardDecision::Allow | GuardDecision::Loading => {}
        }
    }));

    match decision {
        GuardDecision::Allow => children,
        GuardDecision::Loading => rsx! {
            p { class: "loading", "Loading..." }
        },
        GuardDecision::RedirectToLogin { .. } | GuardDecision::Unauthorized => rsx! {},
    }
}
