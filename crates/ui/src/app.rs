use dioxus::prelude::*;
use dioxus_router::Router;

use crate::context::{AppContext, use_auth_provider};
use crate::routes::Route;

#[component]
pub fn App() -> Element {
    let ctx = use_context::<AppContext>();
    use_auth_provider(ctx.auth());

    rsx! {
        document::Stylesheet { href: asset!("/assets/style.css") }

        document::Title { "Certify" }

        div { class: "app-root",
            ErrorBoundary {
                handle_error: |errors: ErrorContext| rsx! {
                    div { class: "fatal",
                        h1 { "Something went wrong" }
                        pre { "{errors:?}" }
                    }
                },
                Router::<Route> {}
            }
        }
    }
}
