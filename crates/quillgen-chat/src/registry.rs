//! The session registry: which sessions exist and which one is active.
//!
//! The backend's listing is authoritative for committed sessions, but a
//! freshly started conversation exists only on this client until its
//! first generation completes and the follow-up refresh brings back the
//! backend's own record. The registry tracks those uncommitted ids
//! separately so selection and transcript loading can treat them
//! correctly.

use std::collections::HashSet;

use quillgen_core::{Session, SessionId};

/// The list of known sessions and the active one.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    /// Sessions as last reported by the backend.
    sessions: Vec<Session>,
    /// The session the transcript belongs to.
    active: Option<SessionId>,
    /// Locally created ids with no backend record yet.
    local: HashSet<SessionId>,
    /// Every id observed in this client's lifetime.
    seen: HashSet<SessionId>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions as last reported by the backend.
    #[must_use]
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// The active session id, if any.
    #[must_use]
    pub fn active(&self) -> Option<SessionId> {
        self.active
    }

    /// The backend record of the active session, when it has one.
    #[must_use]
    pub fn active_session(&self) -> Option<&Session> {
        let active = self.active?;
        self.sessions.iter().find(|s| s.session_id == active)
    }

    /// Whether this id was created locally and has no backend record.
    #[must_use]
    pub fn is_local(&self, id: &SessionId) -> bool {
        self.local.contains(id)
    }

    /// Whether this id is selectable: listed by the backend or created
    /// locally.
    #[must_use]
    pub fn contains(&self, id: &SessionId) -> bool {
        self.local.contains(id) || self.sessions.iter().any(|s| s.session_id == *id)
    }

    /// Replace the listing with a fresh one from the backend.
    ///
    /// Ids that now appear in the backend's listing stop being local:
    /// the backend record supersedes the client-side placeholder. The
    /// active id is left alone.
    pub fn replace(&mut self, sessions: Vec<Session>) {
        for session in &sessions {
            self.seen.insert(session.session_id);
            self.local.remove(&session.session_id);
        }
        self.sessions = sessions;
    }

    /// Activate a known session. Returns `false` for unknown ids.
    pub fn select(&mut self, id: &SessionId) -> bool {
        if self.contains(id) {
            self.active = Some(*id);
            true
        } else {
            false
        }
    }

    /// Start a new conversation: generate an id distinct from every id
    /// seen this lifetime, mark it local, and activate it.
    pub fn start_new(&mut self) -> SessionId {
        let mut id = SessionId::generate();
        while self.seen.contains(&id) {
            id = SessionId::generate();
        }
        self.seen.insert(id);
        self.local.insert(id);
        self.active = Some(id);
        id
    }

    /// Forget a session after it is deleted backend-side. The id stays
    /// in the seen set. Deactivates it if it was active.
    pub fn remove(&mut self, id: &SessionId) {
        self.sessions.retain(|s| s.session_id != *id);
        self.local.remove(id);
        if self.active == Some(*id) {
            self.active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listed(id: SessionId, first_prompt: &str) -> Session {
        Session {
            session_id: id,
            first_prompt: Some(first_prompt.to_string()),
            last_updated: None,
        }
    }

    #[test]
    fn start_new_activates_a_local_session() {
        let mut registry = SessionRegistry::new();
        let id = registry.start_new();

        assert_eq!(registry.active(), Some(id));
        assert!(registry.is_local(&id));
        assert!(registry.contains(&id));
        assert!(registry.sessions().is_empty());
    }

    #[test]
    fn new_ids_are_distinct_from_everything_seen() {
        let mut registry = SessionRegistry::new();
        let listed_id = SessionId::generate();
        registry.replace(vec![listed(listed_id, "hi")]);

        let mut ids: HashSet<SessionId> = HashSet::from([listed_id]);
        for _ in 0..100 {
            assert!(ids.insert(registry.start_new()));
        }
    }

    #[test]
    fn replace_supersedes_local_ids() {
        let mut registry = SessionRegistry::new();
        let id = registry.start_new();
        assert!(registry.is_local(&id));

        // The first generation completed; the refresh now lists it.
        registry.replace(vec![listed(id, "Hello")]);

        assert!(!registry.is_local(&id));
        assert_eq!(registry.active(), Some(id));
        assert_eq!(registry.active_session().unwrap().session_id, id);
    }

    #[test]
    fn select_rejects_unknown_ids() {
        let mut registry = SessionRegistry::new();
        assert!(!registry.select(&SessionId::generate()));
        assert_eq!(registry.active(), None);
    }

    #[test]
    fn select_switches_between_listed_sessions() {
        let mut registry = SessionRegistry::new();
        let a = SessionId::generate();
        let b = SessionId::generate();
        registry.replace(vec![listed(a, "a"), listed(b, "b")]);

        assert!(registry.select(&a));
        assert_eq!(registry.active(), Some(a));
        assert!(registry.select(&b));
        assert_eq!(registry.active(), Some(b));
    }

    #[test]
    fn remove_deactivates_the_active_session() {
        let mut registry = SessionRegistry::new();
        let a = SessionId::generate();
        registry.replace(vec![listed(a, "a")]);
        registry.select(&a);

        registry.remove(&a);

        assert_eq!(registry.active(), None);
        assert!(!registry.contains(&a));
    }
}
