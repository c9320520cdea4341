use crate::transcript::{ChatError, Quota};
use crate::types::{ChatMessage, Origin};
use crate::ui::{AppState, Route};
use crate::views::shared::{Notice, NoticeBanner, format_message_timestamp, markdown_to_html};
use dioxus::events::Key;
use dioxus::prelude::*;

#[derive(Clone, Debug, PartialEq)]
struct TranscriptSummary {
    id: String,
    title: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct ChatSnapshot {
    identifier: String,
    transcripts: Vec<TranscriptSummary>,
    active_id: Option<String>,
    messages: Vec<ChatMessage>,
    quota: Option<Quota>,
    pending: bool,
}

fn quota_label(quota: Option<Quota>, limit: u32) -> Option<String> {
    match quota? {
        Quota::Unlimited => None,
        Quota::Remaining(0) => Some(format!(
            "You've used all {limit} questions for today."
        )),
        Quota::Remaining(1) => Some("1 question left today".to_string()),
        Quota::Remaining(n) => Some(format!("{n} questions left today")),
    }
}

fn is_pending_reply(snapshot: &ChatSnapshot) -> bool {
    snapshot.pending
        && snapshot
            .messages
            .last()
            .is_some_and(|msg| matches!(msg.origin, Origin::User))
}

#[component]
pub fn ChatView() -> Element {
    let state = use_context::<AppState>();
    let nav = use_navigator();
    let mut chat = state.chat;
    let mut input = use_signal(String::new);
    let mut notice = use_signal(|| Option::<Notice>::None);
    let daily_limit = state.config().daily_limit;

    use_effect(move || {
        if !state.is_authenticated() {
            nav.replace(Route::LoginView {});
        }
    });

    // a reply task spawned here dies with the view, so the manager must not
    // keep waiting for it
    use_drop(move || {
        if let Ok(mut guard) = chat.try_write()
            && let Some(ctx) = guard.as_mut()
        {
            ctx.transcripts.cancel_pending();
        }
    });

    let snapshot = chat
        .read()
        .as_ref()
        .map(|ctx| ChatSnapshot {
            identifier: ctx
                .session()
                .map(|s| s.identifier)
                .unwrap_or_default(),
            transcripts: ctx
                .transcripts
                .history()
                .iter()
                .map(|t| TranscriptSummary {
                    id: t.id.clone(),
                    title: t.title.clone(),
                })
                .collect(),
            active_id: ctx.transcripts.active_transcript_id().map(str::to_string),
            messages: ctx.transcripts.active_messages().to_vec(),
            quota: ctx.transcripts.quota_status(),
            pending: ctx.transcripts.has_pending_reply(),
        });
    let Some(snapshot) = snapshot else {
        return rsx! {};
    };

    let mut send_message = move |text: String| {
        let started = {
            let mut guard = chat.write();
            let Some(ctx) = guard.as_mut() else {
                return;
            };
            if ctx.transcripts.has_pending_reply() {
                return;
            }
            match ctx.transcripts.append_user_message(None, &text) {
                Ok(message) => {
                    let transcript_id = ctx
                        .transcripts
                        .active_transcript_id()
                        .map(str::to_string)
                        .unwrap_or_default();
                    let responder = ctx.responder.clone();
                    let reply =
                        ctx.transcripts
                            .request_reply(responder, &transcript_id, &message.body);
                    Ok((transcript_id, reply))
                }
                Err(err) => Err(err),
            }
        };

        match started {
            Ok((transcript_id, reply)) => {
                input.set(String::new());
                spawn(async move {
                    let Some(body) = reply.await else {
                        return;
                    };
                    if let Some(ctx) = chat.write().as_mut()
                        && let Err(err) = ctx.transcripts.append_bot_message(&transcript_id, &body)
                    {
                        tracing::warn!(error = %err, "dropping bot reply");
                    }
                });
            }
            Err(ChatError::EmptyMessage) => {}
            Err(err @ ChatError::QuotaExceeded { .. }) => {
                notice.set(Some(Notice::info(err.to_string())));
            }
            Err(err) => notice.set(Some(Notice::error(err.to_string()))),
        }
    };

    let new_chat = move |_: MouseEvent| {
        if let Some(ctx) = chat.write().as_mut() {
            ctx.transcripts.start_new_transcript();
        }
    };

    let sign_out = move |_: MouseEvent| {
        state.sign_out();
        nav.replace(Route::LoginView {});
    };

    let waiting = snapshot.pending;
    let exhausted = snapshot.quota.is_some_and(|q| q.is_exhausted());
    let pending_row = is_pending_reply(&snapshot);

    rsx! {
        div { class: "chat-layout",
            div { class: "sidebar",
                div { class: "hstack", style: "justify-content: space-between; align-items: center;",
                    span { class: "text-muted", "{snapshot.identifier}" }
                    button { class: "btn", r#type: "button", onclick: sign_out, "Log out" }
                }
                button { class: "btn btn-primary", r#type: "button", onclick: new_chat, "New chat" }
                for summary in snapshot.transcripts.iter() {
                    TranscriptItem {
                        key: "{summary.id}",
                        id: summary.id.clone(),
                        title: summary.title.clone(),
                        active: snapshot.active_id.as_deref() == Some(summary.id.as_str()),
                        on_select: move |id: String| {
                            if let Some(ctx) = chat.write().as_mut() {
                                ctx.transcripts.select_transcript(&id);
                            }
                        },
                    }
                }
            }

            div { class: "main-container",
                NoticeBanner { notice }
                div { id: "chat-list", class: "chat-list",
                    if snapshot.messages.is_empty() {
                        p { class: "text-muted", "Ask me anything to start a conversation." }
                    }
                    for msg in snapshot.messages.iter() {
                        MessageRow { key: "{msg.id}", message: msg.clone() }
                    }
                    if pending_row {
                        div { class: "message-row bot",
                            div { class: "bubble bot",
                                span { class: "shimmer-text", "Thinking…" }
                            }
                        }
                    }
                }

                if let Some(label) = quota_label(snapshot.quota, daily_limit) {
                    div { class: "quota", "{label}" }
                }

                form { class: "composer",
                    textarea {
                        rows: "1", placeholder: "Type your message…",
                        value: "{input}", oninput: move |ev| input.set(ev.value()),
                        onkeydown: move |ev| {
                            if ev.key() == Key::Enter && !ev.modifiers().shift() {
                                ev.prevent_default();
                                send_message(input());
                            }
                        },
                        disabled: waiting || exhausted, autofocus: true,
                    }
                    button {
                        class: "btn btn-primary", r#type: "button",
                        disabled: waiting || exhausted || input().trim().is_empty(),
                        onclick: move |_| send_message(input()),
                        "Send"
                    }
                }
            }
        }
    }
}

#[component]
fn TranscriptItem(id: String, title: String, active: bool, on_select: EventHandler<String>) -> Element {
    let label = if title.is_empty() {
        "New chat".to_string()
    } else {
        title
    };
    let class = if active {
        "transcript-item active"
    } else {
        "transcript-item"
    };
    rsx! {
        button {
            class: class, r#type: "button", title: "{label}",
            onclick: move |_| on_select.call(id.clone()),
            "{label}"
        }
    }
}

#[component]
fn MessageRow(message: ChatMessage) -> Element {
    let side = match message.origin {
        Origin::User => "user",
        Origin::Bot => "bot",
    };
    let timestamp = format_message_timestamp(message.created_at);
    rsx! {
        div { class: format_args!("message-row {side}"),
            div { class: format_args!("bubble {side}"),
                if matches!(message.origin, Origin::Bot) {
                    BotBubble { content: message.body.clone() }
                } else {
                    "{message.body}"
                }
            }
            if let Some(ts) = timestamp {
                div { class: "message-meta",
                    span { class: "message-timestamp", "{ts}" }
                }
            }
        }
    }
}

#[component]
fn BotBubble(content: String) -> Element {
    let content_html = markdown_to_html(&content);
    let copy_payload = content.clone();
    let on_copy = move |_| {
        let raw = copy_payload.clone();
        spawn(async move {
            #[cfg(any(feature = "desktop", feature = "mobile"))]
            {
                if let Ok(mut cb) = arboard::Clipboard::new() {
                    let _ = cb.set_text(raw);
                }
            }
            #[cfg(not(any(feature = "desktop", feature = "mobile")))]
            {
                let _ = raw;
            }
        });
    };

    rsx! {
        div { class: "bubble-controls",
            button { class: "action-btn", title: "Copy", onclick: on_copy, "Copy" }
        }
        div { class: "md", dangerous_inner_html: "{content_html}" }
    }
}
