//! Conversation state: the active transcript, the per-session transcript
//! index, quota enforcement on user turns, and the pending bot reply.
//!
//! All mutation happens synchronously through `&mut self`. The only
//! asynchronous piece is the reply future handed out by
//! [`TranscriptManager::request_reply`], which the manager can abort when the
//! conversation it belongs to stops being the active one.

use crate::responder::Responder;
use crate::session::SessionStore;
use crate::storage::{SharedStore, StorageError};
use crate::types::{ChatMessage, Origin, SCHEMA_VERSION, Session, Transcript};
use futures::future::{AbortHandle, abortable};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("no active session")]
    NoSession,

    #[error("daily question limit of {limit} reached")]
    QuotaExceeded { limit: u32 },

    #[error("unknown transcript: {0}")]
    UnknownTranscript(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quota {
    Unlimited,
    Remaining(u32),
}

impl Quota {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Quota::Remaining(0))
    }
}

pub fn history_key(session_identifier: &str) -> String {
    format!("chat_history_{session_identifier}")
}

#[derive(Serialize)]
struct HistoryRecordRef<'a> {
    version: u32,
    transcripts: &'a [Transcript],
}

#[derive(Deserialize)]
struct HistoryRecord {
    version: u32,
    transcripts: Vec<Transcript>,
}

/// Reads the transcript index for a session. Anything unreadable is empty.
pub fn load_history(store: &SharedStore, session_identifier: &str) -> Vec<Transcript> {
    let Some(raw) = store.get(&history_key(session_identifier)) else {
        return Vec::new();
    };
    match serde_json::from_str::<HistoryRecord>(&raw) {
        Ok(record) if record.version == SCHEMA_VERSION => record.transcripts,
        Ok(record) => {
            tracing::warn!(
                session = session_identifier,
                version = record.version,
                "ignoring transcript history with unknown version"
            );
            Vec::new()
        }
        Err(err) => {
            tracing::warn!(
                session = session_identifier,
                error = %err,
                "ignoring malformed transcript history"
            );
            Vec::new()
        }
    }
}

pub fn save_history(
    store: &SharedStore,
    session_identifier: &str,
    transcripts: &[Transcript],
) -> Result<(), StorageError> {
    let json = serde_json::to_string(&HistoryRecordRef {
        version: SCHEMA_VERSION,
        transcripts,
    })?;
    store.set(&history_key(session_identifier), &json)
}

struct PendingReply {
    transcript_id: String,
    abort: AbortHandle,
}

pub struct TranscriptManager {
    store: SharedStore,
    sessions: SessionStore,
    session_identifier: String,
    daily_limit: u32,
    history: Vec<Transcript>,
    active_id: Option<String>,
    pending: Option<PendingReply>,
}

impl TranscriptManager {
    /// Opens the manager for `session_identifier` with its persisted history.
    pub fn open(
        store: SharedStore,
        sessions: SessionStore,
        session_identifier: impl Into<String>,
        daily_limit: u32,
    ) -> Self {
        let session_identifier = session_identifier.into();
        let history = load_history(&store, &session_identifier);
        tracing::debug!(
            session = %session_identifier,
            transcripts = history.len(),
            "transcript history loaded"
        );
        Self {
            store,
            sessions,
            session_identifier,
            daily_limit,
            history,
            active_id: None,
            pending: None,
        }
    }

    /// Switches to another session's history and returns it.
    pub fn load_history(&mut self, session_identifier: &str) -> Vec<Transcript> {
        self.cancel_pending();
        self.session_identifier = session_identifier.to_string();
        self.history = load_history(&self.store, session_identifier);
        self.active_id = None;
        self.history.clone()
    }

    pub fn session_identifier(&self) -> &str {
        &self.session_identifier
    }

    /// Newest first.
    pub fn history(&self) -> &[Transcript] {
        &self.history
    }

    pub fn active_transcript_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active_transcript(&self) -> Option<&Transcript> {
        let id = self.active_id.as_deref()?;
        self.history.iter().find(|t| t.id == id)
    }

    pub fn active_messages(&self) -> &[ChatMessage] {
        self.active_transcript()
            .map(|t| t.messages.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_pending_reply(&self) -> bool {
        self.pending.is_some()
    }

    pub fn quota_status(&self) -> Option<Quota> {
        self.sessions
            .get_session()
            .map(|session| quota_for(&session, self.daily_limit))
    }

    /// Drops the active pointer. Persisted transcripts are left alone.
    pub fn start_new_transcript(&mut self) {
        self.cancel_pending();
        self.active_id = None;
    }

    /// Makes `transcript_id` active and returns its messages. Unknown ids
    /// change nothing and return an empty list.
    pub fn select_transcript(&mut self, transcript_id: &str) -> Vec<ChatMessage> {
        let Some(messages) = self
            .history
            .iter()
            .find(|t| t.id == transcript_id)
            .map(|t| t.messages.clone())
        else {
            return Vec::new();
        };

        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.transcript_id != transcript_id)
        {
            self.cancel_pending();
        }
        self.active_id = Some(transcript_id.to_string());
        messages
    }

    /// Appends a user turn. `None` targets the active transcript, starting a
    /// new one when nothing is active.
    ///
    /// Rejected without any state change when the trimmed body is empty, no
    /// session exists, a non-admin session has used up its daily limit, or
    /// the updated count cannot be written.
    pub fn append_user_message(
        &mut self,
        transcript_id: Option<&str>,
        body: &str,
    ) -> Result<ChatMessage, ChatError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let mut session = self.sessions.get_session().ok_or(ChatError::NoSession)?;
        if quota_for(&session, self.daily_limit).is_exhausted() {
            tracing::debug!(session = %session.identifier, "daily limit reached, message rejected");
            return Err(ChatError::QuotaExceeded {
                limit: self.daily_limit,
            });
        }

        if let Some(id) = transcript_id
            && !self.history.iter().any(|t| t.id == id)
        {
            return Err(ChatError::UnknownTranscript(id.to_string()));
        }

        if !session.role.is_admin() {
            session.daily_question_count += 1;
            self.sessions.update_session(&session)?;
        }

        if let Some(id) = transcript_id
            && self.active_id.as_deref() != Some(id)
        {
            self.select_transcript(id);
        }

        let message = ChatMessage::new(Origin::User, body);
        let index = match self.active_index() {
            Some(index) => index,
            None => {
                self.history.insert(0, Transcript::new());
                self.active_id = Some(self.history[0].id.clone());
                0
            }
        };
        let transcript = &mut self.history[index];
        transcript.messages.push(message.clone());
        transcript.refresh_title();
        tracing::debug!(
            transcript = %transcript.id,
            count = session.daily_question_count,
            "user message appended"
        );

        self.persist();
        Ok(message)
    }

    /// Appends a bot turn to the owning transcript, active or not.
    pub fn append_bot_message(
        &mut self,
        transcript_id: &str,
        body: &str,
    ) -> Result<ChatMessage, ChatError> {
        let transcript = self
            .history
            .iter_mut()
            .find(|t| t.id == transcript_id)
            .ok_or_else(|| ChatError::UnknownTranscript(transcript_id.to_string()))?;

        let message = ChatMessage::new(Origin::Bot, body);
        transcript.messages.push(message.clone());
        transcript.refresh_title();

        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.transcript_id == transcript_id)
        {
            self.pending = None;
        }

        self.persist();
        Ok(message)
    }

    /// Starts a reply for `transcript_id`. The returned future yields `None`
    /// if the reply was cancelled by a newer request, a new transcript, a
    /// switch to another transcript, or teardown.
    pub fn request_reply(
        &mut self,
        responder: Arc<dyn Responder>,
        transcript_id: &str,
        message: &str,
    ) -> impl Future<Output = Option<String>> + Send + 'static {
        self.cancel_pending();

        let message = message.to_string();
        let (reply, abort) = abortable(async move { responder.respond(&message).await });
        self.pending = Some(PendingReply {
            transcript_id: transcript_id.to_string(),
            abort,
        });

        async move { reply.await.ok() }
    }

    pub fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            tracing::debug!(transcript = %pending.transcript_id, "pending reply cancelled");
            pending.abort.abort();
        }
    }

    /// Releases in-memory state. Persisted transcripts stay on disk.
    pub fn teardown(&mut self) {
        self.cancel_pending();
        self.active_id = None;
        self.history.clear();
    }

    fn active_index(&self) -> Option<usize> {
        let id = self.active_id.as_deref()?;
        self.history.iter().position(|t| t.id == id)
    }

    fn persist(&self) {
        if let Err(err) = save_history(&self.store, &self.session_identifier, &self.history) {
            tracing::error!(session = %self.session_identifier, error = %err, "failed to persist transcripts");
        }
    }
}

impl Drop for TranscriptManager {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

fn quota_for(session: &Session, daily_limit: u32) -> Quota {
    if session.role.is_admin() {
        Quota::Unlimited
    } else {
        Quota::Remaining(daily_limit.saturating_sub(session.daily_question_count))
    }
}
