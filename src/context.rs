//! The signed-in chat context.
//!
//! A [`ChatContext`] exists from sign-in to sign-out and owns everything that
//! used to be ambient: the store handle, the session store, the auth gate, the
//! transcript manager and the responder.

use crate::auth::{AuthError, AuthGate, local_token};
use crate::config::AppConfig;
use crate::responder::{MockResponder, Responder};
use crate::session::SessionStore;
use crate::storage::SharedStore;
use crate::transcript::TranscriptManager;
use crate::types::{Session, UserRole};
use std::sync::Arc;

pub struct ChatContext {
    pub sessions: SessionStore,
    pub gate: AuthGate,
    pub transcripts: TranscriptManager,
    pub responder: Arc<dyn Responder>,
}

impl ChatContext {
    /// Signs in: writes a fresh session, issues a credential (a local one
    /// unless `token` came from the signup backend) and loads history.
    pub fn init(
        store: SharedStore,
        config: &AppConfig,
        identifier: &str,
        role: UserRole,
        token: Option<String>,
    ) -> Result<Self, AuthError> {
        let sessions = SessionStore::new(store.clone());
        let gate = AuthGate::new(store.clone());

        let session = sessions.create_session(identifier, role)?;
        gate.issue_credential(token.unwrap_or_else(local_token), config.token_ttl)?;

        Ok(Self::build(store, config, sessions, gate, &session))
    }

    /// Rebuilds the context from what is already stored. `None` when there is
    /// no credential or no session to resume.
    pub fn resume(store: SharedStore, config: &AppConfig) -> Option<Self> {
        let sessions = SessionStore::new(store.clone());
        let gate = AuthGate::new(store.clone());
        if !gate.is_authenticated() {
            return None;
        }
        let session = sessions.get_session()?;
        Some(Self::build(store, config, sessions, gate, &session))
    }

    fn build(
        store: SharedStore,
        config: &AppConfig,
        sessions: SessionStore,
        gate: AuthGate,
        session: &Session,
    ) -> Self {
        let transcripts = TranscriptManager::open(
            store,
            sessions.clone(),
            session.identifier.clone(),
            config.daily_limit,
        );
        Self {
            sessions,
            gate,
            transcripts,
            responder: Arc::new(MockResponder::new(config.reply_delay)),
        }
    }

    /// Replaces the responder, e.g. with a real backend.
    pub fn with_responder(mut self, responder: Arc<dyn Responder>) -> Self {
        self.responder = responder;
        self
    }

    pub fn session(&self) -> Option<Session> {
        self.sessions.get_session()
    }

    /// Signs out: cancels pending work, clears the session and revokes the
    /// credential. Transcript history stays persisted for the next sign-in.
    pub fn teardown(mut self) -> Result<(), AuthError> {
        self.transcripts.teardown();
        self.sessions.clear_session()?;
        self.gate.revoke_credential()?;
        tracing::info!("signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_init_resume_teardown() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let config = AppConfig::default();

        assert!(ChatContext::resume(store.clone(), &config).is_none());

        let mut ctx =
            ChatContext::init(store.clone(), &config, "alice", UserRole::Viewer, None).unwrap();
        assert!(ctx.gate.is_authenticated());
        ctx.transcripts.append_user_message(None, "Hello").unwrap();

        let resumed = ChatContext::resume(store.clone(), &config).unwrap();
        assert_eq!(resumed.transcripts.history().len(), 1);
        assert_eq!(resumed.session().unwrap().daily_question_count, 1);

        resumed.teardown().unwrap();
        assert!(!AuthGate::new(store.clone()).is_authenticated());
        assert!(SessionStore::new(store.clone()).get_session().is_none());
        assert!(ChatContext::resume(store, &config).is_none());
    }

    #[test]
    fn test_init_uses_backend_token() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let ctx = ChatContext::init(
            store,
            &AppConfig::default(),
            "bob@example.com",
            UserRole::Editor,
            Some("server-token".into()),
        )
        .unwrap();
        assert_eq!(ctx.gate.credential().unwrap().token, "server-token");
    }
}
