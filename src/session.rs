//! Signed-in user state (identity, role and daily question count).

use crate::storage::{SharedStore, StorageError};
use crate::types::{SCHEMA_VERSION, Session, UserRole};
use serde::{Deserialize, Serialize};

pub const SESSION_KEY: &str = "chat_session";

#[derive(Serialize, Deserialize)]
struct SessionRecord {
    version: u32,
    #[serde(flatten)]
    session: Session,
}

/// Reads and writes the single session blob. Last write wins.
#[derive(Clone)]
pub struct SessionStore {
    store: SharedStore,
}

impl SessionStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn create_session(
        &self,
        identifier: impl Into<String>,
        role: UserRole,
    ) -> Result<Session, StorageError> {
        let session = Session {
            identifier: identifier.into(),
            role,
            daily_question_count: 0,
        };
        self.update_session(&session)?;
        tracing::info!(identifier = %session.identifier, role = %session.role, "session created");
        Ok(session)
    }

    /// Missing, malformed or out-of-date blobs all read as no session.
    pub fn get_session(&self) -> Option<Session> {
        let raw = self.store.get(SESSION_KEY)?;
        match serde_json::from_str::<SessionRecord>(&raw) {
            Ok(record) if record.version == SCHEMA_VERSION => Some(record.session),
            Ok(record) => {
                tracing::warn!(version = record.version, "ignoring session with unknown version");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "ignoring malformed session");
                None
            }
        }
    }

    pub fn update_session(&self, session: &Session) -> Result<(), StorageError> {
        let record = SessionRecord {
            version: SCHEMA_VERSION,
            session: session.clone(),
        };
        let json = serde_json::to_string(&record)?;
        self.store.set(SESSION_KEY, &json)
    }

    pub fn clear_session(&self) -> Result<(), StorageError> {
        tracing::debug!("session cleared");
        self.store.remove(SESSION_KEY)
    }

    /// Puts the question count back to zero. Returns the updated session, or
    /// `None` when nobody is signed in.
    pub fn reset_daily_count(&self) -> Result<Option<Session>, StorageError> {
        let Some(mut session) = self.get_session() else {
            return Ok(None);
        };
        session.daily_question_count = 0;
        self.update_session(&session)?;
        Ok(Some(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn store() -> (Arc<MemoryStore>, SessionStore) {
        let backing = Arc::new(MemoryStore::new());
        let sessions = SessionStore::new(backing.clone());
        (backing, sessions)
    }

    #[test]
    fn test_create_and_get() {
        let (_, sessions) = store();
        let created = sessions.create_session("alice", UserRole::Viewer).unwrap();
        assert_eq!(created.daily_question_count, 0);
        assert_eq!(sessions.get_session(), Some(created));
    }

    #[test]
    fn test_get_without_create_is_absent() {
        let (_, sessions) = store();
        assert_eq!(sessions.get_session(), None);
    }

    #[test]
    fn test_get_is_idempotent() {
        let (_, sessions) = store();
        sessions.create_session("bob", UserRole::Editor).unwrap();
        assert_eq!(sessions.get_session(), sessions.get_session());
    }

    #[test]
    fn test_malformed_blob_is_absent() {
        let (backing, sessions) = store();
        backing.set(SESSION_KEY, "{not json").unwrap();
        assert_eq!(sessions.get_session(), None);

        backing
            .set(SESSION_KEY, r#"{"identifier":"x","role":"admin","dailyQuestionCount":-1}"#)
            .unwrap();
        assert_eq!(sessions.get_session(), None);
    }

    #[test]
    fn test_version_mismatch_is_absent() {
        let (backing, sessions) = store();
        backing
            .set(
                SESSION_KEY,
                r#"{"version":2,"identifier":"x","role":"admin","dailyQuestionCount":0}"#,
            )
            .unwrap();
        assert_eq!(sessions.get_session(), None);
    }

    #[test]
    fn test_persisted_shape() {
        let (backing, sessions) = store();
        sessions.create_session("carol", UserRole::Admin).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&backing.get(SESSION_KEY).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["identifier"], "carol");
        assert_eq!(raw["role"], "admin");
        assert_eq!(raw["dailyQuestionCount"], 0);
    }

    #[test]
    fn test_update_clear_and_reset() {
        let (_, sessions) = store();
        let mut session = sessions.create_session("dave", UserRole::Viewer).unwrap();
        session.daily_question_count = 7;
        sessions.update_session(&session).unwrap();
        assert_eq!(sessions.get_session().unwrap().daily_question_count, 7);

        let reset = sessions.reset_daily_count().unwrap().unwrap();
        assert_eq!(reset.daily_question_count, 0);

        sessions.clear_session().unwrap();
        assert_eq!(sessions.get_session(), None);
        assert_eq!(sessions.reset_daily_count().unwrap(), None);
    }
}
