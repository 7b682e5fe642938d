//! Guard session store.
//!
//! Uses `DashMap` so handlers can read and write without a shared lock.

use dashmap::DashMap;

use super::session::GuardSession;

/// Thread-safe store of guard sessions keyed by session id.
pub struct GuardSessionStore {
    sessions: DashMap<String, GuardSession>,
}

impl GuardSessionStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Store a session. Overwrites any session with the same id.
    pub fn insert(&self, session: GuardSession) {
        self.sessions.insert(session.id.clone(), session);
    }

    /// Get a session by id.
    pub fn get(&self, id: &str) -> Option<GuardSession> {
        self.sessions.get(id).map(|s| s.value().clone())
    }

    /// Flip the enabled flag. Returns the updated session if it exists.
    pub fn set_enabled(&self, id: &str, enabled: bool) -> Option<GuardSession> {
        self.sessions.get_mut(id).map(|mut s| {
            s.enabled = enabled;
            s.value().clone()
        })
    }

    /// Remove a session, returning it if it existed.
    pub fn remove(&self, id: &str) -> Option<GuardSession> {
        self.sessions.remove(id).map(|(_, v)| v)
    }

    /// All sessions, oldest first.
    pub fn list(&self) -> Vec<GuardSession> {
        let mut sessions: Vec<GuardSession> =
            self.sessions.iter().map(|e| e.value().clone()).collect();
        sessions.sort_by_key(|s| s.created_at);
        sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for GuardSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
