use certify_core::forms::LoginForm;
use dioxus::prelude::*;
use dioxus_router::{Link, use_navigator};

use crate::context::{AppContext, AuthUi};
use crate::routes::{Route, landing_route, route_for_path};
use crate::vm::LoginErrorsVm;

#[component]
pub fn LoginView() -> Element {
    let ctx = use_context::<AppContext>();
    let auth_ui = use_context::<AuthUi>();
    let navigator = use_navigator();

    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut errors = use_signal(LoginErrorsVm::default);
    let mut submitting = use_signal(|| false);

    let on_submit = use_callback(move |()| {
        if submitting() {
            return;
        }
        let auth = ctx.auth();
        let form = LoginForm {
            email: email(),
            password: password(),
        };
        submitting.set(true);
        spawn(async move {
            let result = auth.login(&form).await;
            submitting.set(false);
            match result {
                Ok(user) => {
                    errors.set(LoginErrorsVm::default());
                    auth_ui.sync(&auth);
                    let target = auth_ui
                        .take_redirect()
                        .and_then(|path| route_for_path(&path))
                        .unwrap_or_else(|| landing_route(&user.role));
                    navigator.replace(target);
                }
                Err(err) => {
                    tracing::info!(%err, "login rejected");
                    errors.set(LoginErrorsVm::from(&err));
                }
            }
        });
    });

    let current = errors.read().clone();
    let submit_label = if submitting() { "Signing in..." } else { "Login" };

    rsx! {
        div { class: "page login",
            h2 { "Welcome Back" }
            if let Some(banner) = current.banner {
                p { class: "error banner", "{banner}" }
            }
            form {
                onsubmit: move |evt| {
                    evt.prevent_default();
                    on_submit.call(());
                },
                label { r#for: "login-email", "Email" }
                input {
                    id: "login-email",
                    r#type: "email",
                    value: "{email}",
                    oninput: move |evt| email.set(evt.value()),
                }
                if let Some(message) = current.email {
                    p { class: "error", "{message}" }
                }
                label { r#for: "login-password", "Password" }
                input {
                    id: "login-password",
                    r#type: "password",
                    value: "{password}",
                    oninput: move |evt| password.set(evt.value()),
                }
                if let Some(message) = current.password {
                    p { class: "error", "{message}" }
                }
                button {
                    id: "login-submit",
                    class: "primary",
                    r#type: "submit",
                    disabled: submitting(),
                    "{submit_label}"
                }
            }
            p { class: "switch",
                "Don't have an account? "
                Link { to: Route::Register {}, "Create an account" }
            }
        }
    }
}
