//! # Dialogue Session Store Module
//!
//! This module holds per-chat conversation state while a multi-turn search
//! dialogue is in progress. Sessions are kept in an in-process keyed map,
//! owned exclusively by the store; at most one live session exists per chat.
//!
//! Expiry is lazy: a session idle longer than the configured timeout is
//! discarded the next time the chat is touched. The current time is always
//! passed in by the caller so tests can drive expiry without sleeping.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// Conversation state of a search dialogue
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogState {
    /// Waiting for the user to name the role they search for
    #[default]
    AwaitingRole,
    /// Role known, waiting for the city
    AwaitingLocation,
    /// Both fields collected, query ready for report generation
    Ready,
    /// Report produced, session about to be cleared
    Completed,
    /// Idle timeout elapsed or dialogue cancelled
    Expired,
}

/// Per-chat dialogue state with the partially collected query
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DialogSession {
    pub chat_id: i64,
    pub state: DialogState,
    pub partial: crate::query::Query,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DialogSession {
    fn new(chat_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            chat_id,
            state: DialogState::AwaitingRole,
            partial: crate::query::Query::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Thread-safe keyed store for live dialogue sessions
///
/// The store is the single owner of session lifetime: sessions are created
/// on first access, refreshed on update, and removed on completion,
/// cancellation, or idle expiry.
pub struct SessionStore {
    sessions: Mutex<HashMap<i64, DialogSession>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    fn is_expired(&self, session: &DialogSession, now: DateTime<Utc>) -> bool {
        now - session.updated_at > self.idle_timeout
    }

    /// Discard the chat's session if it sat idle past the timeout
    fn evict_if_expired(
        &self,
        sessions: &mut HashMap<i64, DialogSession>,
        chat_id: i64,
        now: DateTime<Utc>,
    ) {
        let stale = sessions
            .get(&chat_id)
            .is_some_and(|s| self.is_expired(s, now));
        if stale {
            if let Some(mut session) = sessions.remove(&chat_id) {
                session.state = DialogState::Expired;
                debug!(chat_id, "discarding expired dialogue session");
            }
        }
    }

    /// Return the live session for a chat, or create a fresh one.
    ///
    /// A stale session is transparently discarded first, so a chat that went
    /// silent past the idle timeout starts over from [`DialogState::AwaitingRole`].
    pub fn get_or_create(&self, chat_id: i64, now: DateTime<Utc>) -> DialogSession {
        let mut sessions = self.sessions.lock().unwrap();
        self.evict_if_expired(&mut sessions, chat_id, now);
        sessions
            .entry(chat_id)
            .or_insert_with(|| DialogSession::new(chat_id, now))
            .clone()
    }

    /// Return the live session for a chat without creating one.
    ///
    /// Expired sessions are discarded and reported as absent.
    pub fn get(&self, chat_id: i64, now: DateTime<Utc>) -> Option<DialogSession> {
        let mut sessions = self.sessions.lock().unwrap();
        self.evict_if_expired(&mut sessions, chat_id, now);
        sessions.get(&chat_id).cloned()
    }

    /// Persist a mutated session, stamping `updated_at`
    pub fn update(&self, mut session: DialogSession, now: DateTime<Utc>) {
        session.updated_at = now;
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(session.chat_id, session);
    }

    /// Drop the session for a chat, if any
    pub fn clear(&self, chat_id: i64) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.remove(&chat_id);
    }

    /// Number of live sessions (expiry not evaluated)
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(Duration::minutes(10))
    }

    #[test]
    fn test_get_or_create_starts_awaiting_role() {
        let store = store();
        let now = Utc::now();
        let session = store.get_or_create(42, now);
        assert_eq!(session.state, DialogState::AwaitingRole);
        assert_eq!(session.chat_id, 42);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_one_live_session_per_chat() {
        let store = store();
        let now = Utc::now();
        let mut session = store.get_or_create(42, now);
        session.state = DialogState::AwaitingLocation;
        session.partial.role = "кассир".to_string();
        store.update(session, now);

        // A second access resumes the same session instead of creating one
        let resumed = store.get_or_create(42, now + Duration::minutes(1));
        assert_eq!(resumed.state, DialogState::AwaitingLocation);
        assert_eq!(resumed.partial.role, "кассир");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_idle_timeout_discards_session() {
        let store = store();
        let now = Utc::now();
        let mut session = store.get_or_create(42, now);
        session.state = DialogState::AwaitingLocation;
        session.partial.role = "кассир".to_string();
        store.update(session, now);

        let later = now + Duration::minutes(11);
        assert!(store.get(42, later).is_none());
        assert!(store.is_empty());

        // Next access starts a fresh dialogue, old partial state is gone
        let fresh = store.get_or_create(42, later);
        assert_eq!(fresh.state, DialogState::AwaitingRole);
        assert_eq!(fresh.partial.role, "");
    }

    #[test]
    fn test_update_refreshes_idle_clock() {
        let store = store();
        let now = Utc::now();
        let session = store.get_or_create(42, now);
        store.update(session, now + Duration::minutes(9));

        // 9 + 9 minutes of idle in total, but never more than 10 at once
        let session = store.get(42, now + Duration::minutes(18));
        assert!(session.is_some());
    }

    #[test]
    fn test_clear_removes_session() {
        let store = store();
        let now = Utc::now();
        store.get_or_create(42, now);
        store.clear(42);
        assert!(store.get(42, now).is_none());
    }

    #[test]
    fn test_session_state_serialization() {
        let now = Utc::now();
        let store = store();
        let mut session = store.get_or_create(42, now);
        session.state = DialogState::AwaitingLocation;
        session.partial.role = "кассир".to_string();

        let json = serde_json::to_string(&session).unwrap();
        let back: DialogSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back.state, DialogState::AwaitingLocation);
        assert_eq!(back.partial.role, "кассир");
        assert_eq!(back.chat_id, 42);
    }

    #[test]
    fn test_sessions_are_isolated_per_chat() {
        let store = store();
        let now = Utc::now();
        let mut a = store.get_or_create(1, now);
        a.partial.role = "бариста".to_string();
        store.update(a, now);
        let b = store.get_or_create(2, now);
        assert_eq!(b.partial.role, "");
        assert_eq!(store.len(), 2);
    }
}
