//! Session registry
//!
//! The authoritative, concurrency-safe map from username to live
//! session. A single mutex guards the map; every operation holds it for
//! its whole critical section and never across an await, so no
//! operation is ever observed partially applied.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::ChatError;
use crate::session::Session;

/// Registry of currently active sessions keyed by username
///
/// Enforces username uniqueness and the configured capacity. Holds each
/// session's producer queue handle; the session's writer task owns the
/// consumer side.
#[derive(Debug)]
pub struct Registry {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
    queue_capacity: usize,
}

impl Registry {
    /// Create an empty registry with the given limits
    pub fn new(max_sessions: usize, queue_capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_sessions,
            queue_capacity,
        }
    }

    /// Register a username and create its session.
    ///
    /// Capacity is re-checked here even though the accept loop already
    /// pre-checks it; two connections racing through the handshake must
    /// not both slip past the limit. Returns the session handle and the
    /// consumer half of its outbound queue.
    pub fn register(
        &self,
        username: &str,
    ) -> Result<(Arc<Session>, mpsc::Receiver<String>), ChatError> {
        let mut sessions = self.sessions.lock();
        if sessions.len() >= self.max_sessions {
            return Err(ChatError::CapacityExceeded);
        }
        if sessions.contains_key(username) {
            return Err(ChatError::NameTaken);
        }
        let (session, rx) = Session::new(self.queue_capacity);
        let session = Arc::new(session);
        sessions.insert(username.to_string(), Arc::clone(&session));
        Ok((session, rx))
    }

    /// Atomically move a session from `old` to `new`.
    ///
    /// The absence check and the move happen in one critical section, so
    /// two concurrent renames to the same target cannot both succeed.
    /// Renaming to the current name counts as taken.
    pub fn rename(&self, old: &str, new: &str) -> Result<(), ChatError> {
        let mut sessions = self.sessions.lock();
        if sessions.contains_key(new) {
            return Err(ChatError::NameTaken);
        }
        let Some(session) = sessions.remove(old) else {
            return Err(ChatError::ConnectionClosed);
        };
        sessions.insert(new.to_string(), session);
        Ok(())
    }

    /// Remove a username if present; safe to call twice
    pub fn unregister(&self, username: &str) {
        self.sessions.lock().remove(username);
    }

    /// Snapshot the current recipients for a broadcast.
    ///
    /// Names and handles are cloned under the lock; delivery happens
    /// outside it so no I/O ever runs while the registry is held.
    pub fn snapshot_excluding(&self, excluded: Option<&str>) -> Vec<(String, Arc<Session>)> {
        self.sessions
            .lock()
            .iter()
            .filter(|(name, _)| excluded != Some(name.as_str()))
            .map(|(name, session)| (name.clone(), Arc::clone(session)))
            .collect()
    }

    /// Whether a username is currently registered
    pub fn contains(&self, username: &str) -> bool {
        self.sessions.lock().contains_key(username)
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether no session is registered
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Whether the registry is at its configured maximum
    pub fn is_full(&self) -> bool {
        self.sessions.lock().len() >= self.max_sessions
    }
}
