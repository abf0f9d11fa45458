//! In-memory store of chat sessions keyed by session ID.
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use anyhow::{Result, anyhow};
use tokio::sync::Mutex;

use super::models::Session;

pub type SharedSession = Arc<Mutex<Session>>;

/// Holds every live session. The map lock is only held for lookups
/// and inserts, each session has its own async lock which is held for
/// the duration of a chat turn.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SharedSession>>,
    system_message: String,
    max_turns: usize,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(system_message: &str, max_turns: usize, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            system_message: system_message.to_string(),
            max_turns,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Fetch the session for `id` and mark it as recently used.
    pub fn get(&self, id: &str) -> Result<Option<SharedSession>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| anyhow!("Session store lock poisoned"))?;
        let session = sessions.get(id).cloned();
        if let Some(session) = &session {
            touch(session);
        }
        Ok(session)
    }

    /// Fetch the session for `id`, creating a fresh one seeded with
    /// the system message if it doesn't exist yet.
    pub fn get_or_create(&self, id: &str) -> Result<SharedSession> {
        if let Some(session) = self.get(id)? {
            return Ok(session);
        }

        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| anyhow!("Session store lock poisoned"))?;
        if let Some(session) = sessions.get(id) {
            return Ok(Arc::clone(session));
        }
        if sessions.len() >= self.max_sessions {
            evict_least_recent(&mut sessions);
        }
        let session = Arc::new(Mutex::new(Session::new(
            &self.system_message,
            self.max_turns,
        )));
        sessions.insert(id.to_string(), Arc::clone(&session));
        Ok(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// A session mid turn is already marked active by the lock holder
fn touch(session: &SharedSession) {
    if let Ok(mut session) = session.try_lock() {
        session.last_active = Instant::now();
    }
}

// Sessions still referenced outside the store belong to an open
// connection or a request in flight and are never evicted. When every
// session is in use the store grows past its limit.
fn evict_least_recent(sessions: &mut HashMap<String, SharedSession>) {
    let oldest = sessions
        .iter()
        .filter(|(_, session)| Arc::strong_count(session) == 1)
        .filter_map(|(id, session)| {
            session
                .try_lock()
                .ok()
                .map(|s| (id.clone(), s.last_active))
        })
        .min_by_key(|(_, last_active)| *last_active)
        .map(|(id, _)| id);

    match oldest {
        Some(id) => {
            tracing::debug!("Evicting chat session {}", id);
            sessions.remove(&id);
        }
        None => tracing::warn!(
            "All {} chat sessions are in use, nothing to evict",
            sessions.len()
        ),
    }
}
