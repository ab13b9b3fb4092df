use certify_core::forms::{Field, RegistrationForm, password_strength};
use dioxus::prelude::*;
use dioxus_router::Link;

use crate::context::AppContext;
use crate::routes::Route;
use crate::vm::{RegisterErrorsVm, RegisterPage, StrengthVm};

#[component]
pub fn RegisterView() -> Element {
    let ctx = use_context::<AppContext>();
    let mut form = use_signal(RegistrationForm::default);
    let mut page = use_signal(|| RegisterPage::Identity);
    let mut errors = use_signal(RegisterErrorsVm::default);
    let mut submitting = use_signal(|| false);
    let mut welcomed = use_signal(|| None::<String>);

    let on_continue = use_callback(move |()| match form.read().validate_identity() {
        Ok(()) => {
            errors.set(RegisterErrorsVm::default());
            page.set(RegisterPage::Security);
        }
        Err(fields) => errors.set(RegisterErrorsVm {
            fields,
            banner: None,
        }),
    });

    let on_submit = use_callback(move |()| {
        if submitting() {
            return;
        }
        let users = ctx.users();
        let draft = form.read().clone();
        submitting.set(true);
        spawn(async move {
            let result = users.register(&draft).await;
            submitting.set(false);
            match result {
                Ok(_) => {
                    errors.set(RegisterErrorsVm::default());
                    welcomed.set(Some(draft.first_name.trim().to_string()));
                }
                Err(err) => {
                    tracing::info!(%err, "registration rejected");
                    errors.set(RegisterErrorsVm::from(&err));
                }
            }
        });
    });

    if let Some(first_name) = welcomed() {
        return rsx! {
            div { class: "page register success",
                h2 { "Registration Successful!" }
                p { "Welcome {first_name}! Your account has been created successfully." }
                Link { to: Route::Login {}, "Sign in" }
            }
        };
    }

    let current = form.read().clone();
    let shown = errors.read().clone();
    let step = page();
    let strength = StrengthVm::from(&password_strength(&current.password));
    let submit_label = if submitting() { "Creating account..." } else { "Create Account" };

    rsx! {
        div { class: "page register",
            h2 { "Create Your Account" }
            p { class: "subtitle", "{step.subtitle()}" }
            div { class: "progress",
                span { class: "progress-fill", style: "width: {step.progress_pct()}%" }
            }
            if let Some(banner) = shown.banner {
                p { class: "error banner", "{banner}" }
            }
            form {
                onsubmit: move |evt| {
                    evt.prevent_default();
                    match step {
                        RegisterPage::Identity => on_continue.call(()),
                        RegisterPage::Security => on_submit.call(()),
                    }
                },
                match step {
                    RegisterPage::Identity => rsx! {
                        label { r#for: "register-first-name", "First Name" }
                        input {
                            id: "register-first-name",
                            placeholder: "Enter your first name",
                            value: "{current.first_name}",
                            oninput: move |evt| {
                                form.write().first_name = evt.value();
                                errors.write().fields.clear(Field::FirstName);
                            },
                        }
                        FieldError { message: shown.fields.get(Field::FirstName) }
                        label { r#for: "register-last-name", "Last Name" }
                        input {
                            id: "register-last-name",
                            placeholder: "Enter your last name",
                            value: "{current.last_name}",
                            oninput: move |evt| {
                                form.write().last_name = evt.value();
                                errors.write().fields.clear(Field::LastName);
                            },
                        }
                        FieldError { message: shown.fields.get(Field::LastName) }
                        label { r#for: "register-email", "Email" }
                        input {
                            id: "register-email",
                            r#type: "email",
                            placeholder: "Enter your email",
                            value: "{current.email}",
                            oninput: move |evt| {
                                form.write().email = evt.value();
                                errors.write().fields.clear(Field::Email);
                            },
                        }
                        FieldError { message: shown.fields.get(Field::Email) }
                        button { id: "register-continue", class: "primary", r#type: "submit", "Continue" }
                    },
                    RegisterPage::Security => rsx! {
                        label { r#for: "register-password", "Password" }
                        input {
                            id: "register-password",
                            r#type: "password",
                            placeholder: "Create a strong password",
                            value: "{current.password}",
                            oninput: move |evt| {
                                form.write().password = evt.value();
                                errors.write().fields.clear(Field::Password);
                            },
                        }
                        if !current.password.is_empty() {
                            StrengthMeter { strength }
                        }
                        FieldError { message: shown.fields.get(Field::Password) }
                        label { r#for: "register-confirm", "Confirm Password" }
                        input {
                            id: "register-confirm",
                            r#type: "password",
                            placeholder: "Confirm your password",
                            value: "{current.confirm_password}",
                            oninput: move |evt| {
                                form.write().confirm_password = evt.value();
                                errors.write().fields.clear(Field::ConfirmPassword);
                            },
                        }
                        FieldError { message: shown.fields.get(Field::ConfirmPassword) }
                        label { class: "terms",
                            input {
                                id: "register-terms",
                                r#type: "checkbox",
                                checked: current.agree_to_terms,
                                onchange: move |evt| {
                                    form.write().agree_to_terms = evt.checked();
                                    errors.write().fields.clear(Field::AgreeToTerms);
                                },
                            }
                            "I agree to the Terms and Conditions"
                        }
                        FieldError { message: shown.fields.get(Field::AgreeToTerms) }
                        button {
                            id: "register-submit",
                            class: "primary",
                            r#type: "submit",
                            disabled: submitting(),
                            "{submit_label}"
                        }
                        button {
                            id: "register-back",
                            r#type: "button",
                            onclick: move |_| page.set(RegisterPage::Identity),
                            "Back to Personal Info"
                        }
                    },
                }
            }
            p { class: "switch",
                "Already have an account? "
                Link { to: Route::Login {}, "Sign in here" }
            }
        }
    }
}

#[component]
fn StrengthMeter(strength: StrengthVm) -> Element {
    rsx! {
        div { class: "strength",
            div { class: "bar",
                span { class: "bar-fill", style: "width: {strength.width_pct}%" }
            }
            span { class: "strength-label", "{strength.label}" }
            ul {
                for missing in strength.missing {
                    li { key: "{missing}", "{missing}" }
                }
            }
        }
    }
}

#[component]
fn FieldError(message: Option<&'static str>) -> Element {
    rsx! {
        if let Some(message) = message {
            p { class: "error", "{message}" }
        }
    }
}
