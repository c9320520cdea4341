use crate::auth::LoginForm;
use crate::ui::{AppState, Route};
use crate::views::shared::{Notice, NoticeBanner};
use dioxus::events::Key;
use dioxus::prelude::*;

pub const ROLE_OPTIONS: &[(&str, &str)] = &[
    ("", "Select a role"),
    ("admin", "Admin"),
    ("editor", "Editor"),
    ("viewer", "Viewer"),
    ("other", "Other"),
];

#[component]
pub fn LoginView() -> Element {
    let state = use_context::<AppState>();
    let nav = use_navigator();
    let mut identifier = use_signal(String::new);
    let mut role = use_signal(String::new);
    let mut notice = use_signal(|| Option::<Notice>::None);

    use_effect(move || {
        if state.is_authenticated() {
            nav.replace(Route::ChatView {});
        }
    });

    let mut submit = move || {
        let form = LoginForm {
            identifier: identifier(),
            role: role(),
        };
        let result = form
            .validate()
            .and_then(|(identifier, role)| state.sign_in(&identifier, role, None));
        if let Err(err) = result {
            notice.set(Some(Notice::error(err.to_string())));
        }
    };

    rsx! {
        div { class: "auth-container",
            h2 { class: "auth-title", "Sign in" }
            NoticeBanner { notice }
            form { class: "auth-form",
                label { r#for: "identifier", "Email" }
                input {
                    id: "identifier", r#type: "email", placeholder: "you@example.com",
                    value: "{identifier}", oninput: move |ev| identifier.set(ev.value()),
                    onkeydown: move |ev| {
                        if ev.key() == Key::Enter {
                            ev.prevent_default();
                            submit();
                        }
                    },
                    autofocus: true,
                }
                label { r#for: "role", "Role" }
                select {
                    id: "role", value: "{role}",
                    onchange: move |ev| role.set(ev.value()),
                    for (value, label) in ROLE_OPTIONS.iter() {
                        option { value: "{value}", "{label}" }
                    }
                }
                button {
                    class: "btn btn-primary", r#type: "button",
                    onclick: move |_| submit(),
                    "Sign in"
                }
            }
            p { class: "auth-switch",
                "No account yet? "
                Link { to: Route::SignupView {}, "Create one" }
            }
        }
    }
}
