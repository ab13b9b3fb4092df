use dioxus::prelude::*;
use dioxus_router::use_navigator;

use crate::routes::Route;

#[component]
pub fn UnauthorizedView() -> Element {
    let navigator = use_navigator();

    rsx! {
        div { class: "page unauthorized",
            h2 { "Unauthorized" }
            p { "You don’t have permission to access this page." }
            div { class: "actions",
                button {
                    id: "unauthorized-back",
                    onclick: move |_| {
                        navigator.go_back();
                    },
                    "Go Back"
                }
                button {
                    id: "unauthorized-login",
                    class: "primary",
                    onclick: move |_| {
                        navigator.push(Route::Login {});
                    },
                    "Login"
                }
            }
        }
    }
}
