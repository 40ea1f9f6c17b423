//! In-memory session store keyed by session id.
//!
//! The lock is only ever held for map operations; handlers take a snapshot,
//! release the lock, await the LLM, then re-lock to record the result.
//! Everything here is lost when the process exits.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use cdss::clinical::ClinicalInput;
use cdss::consult::{HistoryEntry, Session};
use tracing::debug;

/// What a follow-up needs from a session, copied out from under the lock.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub context: Option<ClinicalInput>,
    pub history: Vec<HistoryEntry>,
}

#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        // Pairs are appended under a single acquisition; poisoning cannot split one.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new empty session and return its id.
    pub fn create(&self) -> String {
        let session = Session::new();
        let id = session.id().to_string();
        self.lock().insert(id.clone(), session);
        debug!("Opened session {id}");
        id
    }

    /// End a session, dropping its log and context. Returns `false` if no
    /// such session existed.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.lock().remove(id).is_some();
        if removed {
            debug!("Closed session {id}");
        }
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn history(&self, id: &str) -> Option<Vec<HistoryEntry>> {
        self.lock().get(id).map(|s| s.log().snapshot())
    }

    pub fn snapshot(&self, id: &str) -> Option<SessionSnapshot> {
        self.lock().get(id).map(|s| SessionSnapshot {
            context: s.context().cloned(),
            history: s.log().snapshot(),
        })
    }

    /// Record a successful recommendation. Returns `false` if the session is
    /// gone.
    pub fn record_recommendation(&self, id: &str, input: &ClinicalInput, text: &str) -> bool {
        match self.lock().get_mut(id) {
            Some(session) => {
                session.record_recommendation(input, text);
                true
            }
            None => false,
        }
    }

    /// Record a successful follow-up pair. Returns `false` if the session is
    /// gone.
    pub fn record_exchange(&self, id: &str, question: &str, answer: &str) -> bool {
        match self.lock().get_mut(id) {
            Some(session) => {
                session.record_exchange(question, answer);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdss::clinical::{Severity, SymptomCategory};
    use cdss::consult::Role;

    #[test]
    fn create_then_read_empty_history() {
        let store = SessionStore::new();
        let id = store.create();
        assert!(store.contains(&id));
        assert_eq!(store.history(&id), Some(Vec::new()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_session_is_none() {
        let store = SessionStore::new();
        assert!(store.history("ss-missing").is_none());
        assert!(!store.record_exchange("ss-missing", "q", "a"));
    }

    #[test]
    fn removed_session_is_gone() {
        let store = SessionStore::new();
        let id = store.create();
        store.record_exchange(&id, "q", "a");

        assert!(store.remove(&id));
        assert!(store.history(&id).is_none());
        assert!(store.is_empty());
        assert!(!store.remove(&id));
    }

    #[test]
    fn snapshot_carries_context_and_history() {
        let store = SessionStore::new();
        let id = store.create();
        let input = ClinicalInput::new(SymptomCategory::AnxietyDisorders, Severity::Mild)
            .with_symptoms(["Restlessness"]);
        assert!(store.record_recommendation(&id, &input, "Likely Diagnosis: GAD"));
        assert!(store.record_exchange(&id, "Duration?", "Six months."));

        let snap = store.snapshot(&id).unwrap();
        assert_eq!(snap.context, Some(input));
        let roles: Vec<Role> = snap.history.iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![Role::Ai, Role::Doctor, Role::Ai]);
    }
}
