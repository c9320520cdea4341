use crate::auth::{AuthError, AuthGate};
use crate::config::AppConfig;
use crate::context::ChatContext;
use crate::storage::{SharedStore, default_store};
use crate::types::UserRole;
use crate::views::{ChatView, LoginView, NotFoundView, SignupView};
use dioxus::prelude::*;

#[derive(Routable, Clone, Debug, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[route("/")]
    LoginView {},
    #[route("/signup")]
    SignupView {},
    #[route("/chat")]
    ChatView {},
    #[route("/:..segments")]
    NotFoundView { segments: Vec<String> },
}

/// Shared by every view. `chat` is `Some` exactly while someone is signed in.
#[derive(Clone, Copy)]
pub struct AppState {
    store: Signal<SharedStore>,
    config: Signal<AppConfig>,
    pub chat: Signal<Option<ChatContext>>,
}

impl AppState {
    pub fn config(&self) -> AppConfig {
        (*self.config.peek()).clone()
    }

    /// A context is loaded and its credential is still valid.
    pub fn is_authenticated(&self) -> bool {
        let signed_in = self.chat.read().is_some();
        signed_in && AuthGate::new((*self.store.peek()).clone()).is_authenticated()
    }

    pub fn sign_in(
        &self,
        identifier: &str,
        role: UserRole,
        token: Option<String>,
    ) -> Result<(), AuthError> {
        let store = (*self.store.peek()).clone();
        let config = self.config();
        let context = ChatContext::init(store, &config, identifier, role, token)?;

        // dropping the previous context aborts its pending reply
        let mut chat = self.chat;
        chat.set(Some(context));
        Ok(())
    }

    pub fn sign_out(&self) {
        let mut chat = self.chat;
        let taken = chat.write().take();
        if let Some(context) = taken
            && let Err(err) = context.teardown()
        {
            tracing::warn!(error = %err, "sign out did not complete cleanly");
        }
    }
}

const APP_CSS: &str = r#"
:root { font-family: system-ui, sans-serif; color: #111; background: #fafafa; }
.auth-container { max-width: 360px; margin: 10vh auto; display: flex; flex-direction: column; gap: 1rem; }
.auth-form { display: flex; flex-direction: column; gap: 0.5rem; }
.auth-form input, .auth-form select { padding: 0.5rem; border: 1px solid #ccc; border-radius: 6px; }
.btn { padding: 0.5rem 1rem; border-radius: 6px; border: 1px solid #111; background: transparent; cursor: pointer; }
.btn-primary { background: #111; color: #fff; }
.btn:disabled { opacity: 0.5; cursor: default; }
.notice { padding: 0.5rem 0.75rem; border-radius: 6px; }
.notice.error { background: #fde8e8; color: #9b1c1c; }
.notice.info { background: #e8f0fd; color: #1c3d9b; }
.chat-layout { display: flex; height: 100vh; }
.sidebar { width: 260px; border-right: 1px solid #ddd; display: flex; flex-direction: column; gap: 0.5rem; padding: 0.75rem; }
.transcript-item { text-align: left; padding: 0.5rem; border-radius: 6px; border: none; background: transparent; cursor: pointer; }
.transcript-item.active { background: #e6e6e6; }
.main-container { flex: 1; display: flex; flex-direction: column; }
.chat-list { flex: 1; overflow-y: auto; padding: 1rem; display: flex; flex-direction: column; gap: 0.75rem; }
.message-row.user { align-self: flex-end; }
.message-row.bot { align-self: flex-start; }
.bubble { padding: 0.5rem 0.75rem; border-radius: 10px; max-width: 60ch; }
.bubble.user { background: #111; color: #fff; }
.bubble.bot { background: #fff; border: 1px solid #ddd; }
.message-timestamp { font-size: 0.75rem; color: #777; }
.composer { display: flex; gap: 0.5rem; padding: 0.75rem; border-top: 1px solid #ddd; }
.composer textarea { flex: 1; resize: none; padding: 0.5rem; }
.quota { font-size: 0.8rem; color: #555; padding: 0 0.75rem; }
.shimmer-text { color: #999; font-style: italic; }
"#;

#[component]
pub fn App() -> Element {
    let config = try_use_context::<AppConfig>().unwrap_or_default();
    let store = use_signal(|| default_store(config.data_dir.as_deref()));
    let chat = use_signal(|| ChatContext::resume((*store.peek()).clone(), &config));
    let config = use_signal(|| config);

    use_context_provider(|| AppState {
        store,
        config,
        chat,
    });

    rsx! {
        style { dangerous_inner_html: "{APP_CSS}" }
        Router::<Route> {}
    }
}
