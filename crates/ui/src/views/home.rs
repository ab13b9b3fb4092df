use dioxus::prelude::*;
use dioxus_router::use_navigator;

use crate::context::AuthUi;
use crate::routes::{Route, landing_route};

/// Sends the user to their landing page once the session is known.
#[component]
pub fn HomeView() -> Element {
    let auth_ui = use_context::<AuthUi>();
    let navigator = use_navigator();

    use_effect(move || {
        let snapshot = auth_ui.snapshot.read();
        if snapshot.is_loading() {
            return;
        }
        let target = snapshot
            .user
            .as_ref()
            .map_or(Route::Login {}, |user| landing_route(&user.role));
        navigator.replace(target);
    });

    rsx! {
        div { class: "page",
            p { class: "loading", "Loading..." }
        }
    }
}
