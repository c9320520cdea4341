use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Version stamped into every persisted blob. Anything else decodes as absent.
pub const SCHEMA_VERSION: u32 = 1;

pub const TITLE_MAX_CHARS: usize = 30;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    Admin,
    Editor,
    Viewer,
    Other,
}

impl UserRole {
    /// Parses free-form role input. Empty input means no role was selected.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.to_ascii_lowercase().as_str() {
            "admin" => UserRole::Admin,
            "editor" => UserRole::Editor,
            "viewer" => UserRole::Viewer,
            _ => UserRole::Other,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Editor => "editor",
            UserRole::Viewer => "viewer",
            UserRole::Other => "other",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl From<String> for UserRole {
    fn from(value: String) -> Self {
        UserRole::parse(&value).unwrap_or(UserRole::Other)
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub identifier: String,
    pub role: UserRole,
    pub daily_question_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Bot,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub body: String,
    pub origin: Origin,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ChatMessage {
    pub fn new(origin: Origin, body: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            body: body.into(),
            origin,
            created_at: now_millis(),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self.origin, Origin::User)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub id: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: String::new(),
            messages: Vec::new(),
            created_at: now_millis(),
        }
    }

    /// Re-derives the title from the first user message, if any.
    pub fn refresh_title(&mut self) {
        if let Some(first) = self.messages.iter().find(|m| m.is_user()) {
            self.title = derive_title(&first.body);
        }
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

/// First user message, trimmed, cut to 30 chars with a trailing ellipsis.
pub fn derive_title(body: &str) -> String {
    truncate_chars(body.trim(), TITLE_MAX_CHARS)
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Current UTC time truncated to millisecond precision, which is what
/// survives a round-trip through persisted JSON unchanged.
pub fn now_millis() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    let millis = now.millisecond();
    now.replace_millisecond(millis).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(UserRole::parse(" Admin "), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("viewer"), Some(UserRole::Viewer));
        assert_eq!(UserRole::parse("intern"), Some(UserRole::Other));
        assert_eq!(UserRole::parse("   "), None);
    }

    #[test]
    fn test_title_boundary() {
        let exact = "a".repeat(30);
        assert_eq!(derive_title(&exact), exact);

        let long = "b".repeat(31);
        assert_eq!(derive_title(&long), format!("{}...", "b".repeat(30)));
    }

    #[test]
    fn test_title_counts_chars_not_bytes() {
        let text = "é".repeat(31);
        let title = derive_title(&text);
        assert_eq!(title.chars().count(), 33);
        assert!(title.starts_with(&"é".repeat(30)));
    }

    #[test]
    fn test_now_millis_has_no_sub_millisecond_part() {
        let ts = now_millis();
        assert_eq!(ts.nanosecond() % 1_000_000, 0);
    }

    #[test]
    fn test_session_wire_format() {
        let session = Session {
            identifier: "alice".into(),
            role: UserRole::Viewer,
            daily_question_count: 3,
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["identifier"], "alice");
        assert_eq!(json["role"], "viewer");
        assert_eq!(json["dailyQuestionCount"], 3);
    }
}
