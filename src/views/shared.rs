use comrak::plugins::syntect::SyntectAdapter;
use comrak::{ComrakOptions, ComrakPlugins, markdown_to_html_with_plugins};
use dioxus::prelude::*;
use once_cell::sync::Lazy;
use std::time::Duration;
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

const NOTICE_HIDE_DELAY: Duration = Duration::from_secs(4);

const MESSAGE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]");

static MARKDOWN_OPTIONS: Lazy<ComrakOptions> = Lazy::new(|| {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options
});

pub fn markdown_to_html(md: &str) -> String {
    let adapter = SyntectAdapter::new(Some("base16-ocean.dark"));
    let mut plugins = ComrakPlugins::default();
    plugins.render.codefence_syntax_highlighter = Some(&adapter);
    markdown_to_html_with_plugins(md, &MARKDOWN_OPTIONS, &plugins)
}

pub fn format_message_timestamp(timestamp: OffsetDateTime) -> Option<String> {
    let mut datetime = timestamp;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    datetime.format(MESSAGE_TIME_FORMAT).ok()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Transient user-facing message (validation, quota, backend failures).
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

/// Counts notices shown by one banner. A hide timer only clears the notice it
/// was started for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct NoticeGeneration(u64);

impl NoticeGeneration {
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    fn is_current(self, current: NoticeGeneration) -> bool {
        self == current
    }
}

#[component]
pub fn NoticeBanner(notice: Signal<Option<Notice>>) -> Element {
    let mut generation = use_signal(NoticeGeneration::default);

    use_effect(move || {
        if notice().is_none() {
            return;
        }
        let scheduled = generation.peek().next();
        generation.set(scheduled);

        let mut control = notice;
        spawn(async move {
            tokio::time::sleep(NOTICE_HIDE_DELAY).await;
            if scheduled.is_current(*generation.peek()) {
                control.set(None);
            }
        });
    });

    let Some(current) = notice() else {
        return rsx! {};
    };
    let class = match current.kind {
        NoticeKind::Info => "notice info",
        NoticeKind::Error => "notice error",
    };
    rsx! {
        div { class: class, role: "status", "{current.text}" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_timer_does_not_hide_newer_notice() {
        let first = NoticeGeneration::default().next();
        let second = first.next();

        assert!(!first.is_current(second));
        assert!(second.is_current(second));
    }

    #[test]
    fn test_message_timestamp_format() {
        let ts = time::macros::datetime!(2024-03-01 15:04 UTC);
        let formatted = format_message_timestamp(ts).unwrap();
        assert!(formatted.ends_with("AM") || formatted.ends_with("PM"));
        assert_eq!(formatted.len(), "03:04 PM".len());
    }
}
