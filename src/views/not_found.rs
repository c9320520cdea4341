use crate::ui::Route;
use dioxus::prelude::*;

#[component]
pub fn NotFoundView(segments: Vec<String>) -> Element {
    let path = format!("/{}", segments.join("/"));
    rsx! {
        div { class: "auth-container",
            h2 { "Page not found" }
            p { class: "text-muted", "Nothing lives at {path}." }
            Link { to: Route::LoginView {}, "Back to sign in" }
        }
    }
}
