use crate::auth::{SignupClient, SignupForm};
use crate::ui::{AppState, Route};
use crate::views::login::ROLE_OPTIONS;
use crate::views::shared::{Notice, NoticeBanner};
use dioxus::prelude::*;

#[component]
pub fn SignupView() -> Element {
    let state = use_context::<AppState>();
    let nav = use_navigator();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut role = use_signal(String::new);
    let mut submitting = use_signal(|| false);
    let mut notice = use_signal(|| Option::<Notice>::None);

    use_effect(move || {
        if state.is_authenticated() {
            nav.replace(Route::ChatView {});
        }
    });

    let submit = move |_: MouseEvent| {
        if submitting() {
            return;
        }
        let form = SignupForm {
            email: email(),
            password: password(),
            role: role(),
        };
        let request = match form.validate() {
            Ok(request) => request,
            Err(err) => {
                notice.set(Some(Notice::error(err.to_string())));
                return;
            }
        };

        submitting.set(true);
        let client = SignupClient::new(state.config().auth_endpoint);
        spawn(async move {
            let outcome = match client.register(&request).await {
                Ok(token) => state.sign_in(&request.email, request.role.clone(), Some(token)),
                Err(err) => Err(err),
            };
            if let Err(err) = outcome {
                tracing::warn!(error = %err, "signup failed");
                notice.set(Some(Notice::error(err.to_string())));
            }
            submitting.set(false);
        });
    };

    rsx! {
        div { class: "auth-container",
            h2 { class: "auth-title", "Create an account" }
            NoticeBanner { notice }
            form { class: "auth-form",
                label { r#for: "email", "Email" }
                input {
                    id: "email", r#type: "email", placeholder: "you@example.com",
                    value: "{email}", oninput: move |ev| email.set(ev.value()),
                    autofocus: true,
                }
                label { r#for: "password", "Password" }
                input {
                    id: "password", r#type: "password",
                    value: "{password}", oninput: move |ev| password.set(ev.value()),
                }
                label { r#for: "signup-role", "Role" }
                select {
                    id: "signup-role", value: "{role}",
                    onchange: move |ev| role.set(ev.value()),
                    for (value, label) in ROLE_OPTIONS.iter() {
                        option { value: "{value}", "{label}" }
                    }
                }
                button {
                    class: "btn btn-primary", r#type: "button",
                    disabled: submitting(),
                    onclick: submit,
                    if submitting() { "Creating account…" } else { "Sign up" }
                }
            }
            p { class: "auth-switch",
                "Already registered? "
                Link { to: Route::LoginView {}, "Sign in" }
            }
        }
    }
}
