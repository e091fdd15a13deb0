// MCP session lifecycle: create, validate, touch, terminate

use crate::clock::{Clock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};
use uuid::Uuid;

/// An active MCP session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

/// In-memory session registry.
///
/// Every operation takes the map lock exactly once, so a terminated id is
/// never reported valid by a later call.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Session>>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Start a new session and return its id
    pub fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let now = self.clock.now();

        self.write().insert(
            id.clone(),
            Session {
                id: id.clone(),
                created_at: now,
                last_activity_at: now,
            },
        );

        info!(session_id = %id, "Session created");
        id
    }

    pub fn validate(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    /// Record activity on a session; unknown ids are ignored
    pub fn touch(&self, id: &str) {
        let now = self.clock.now();
        if let Some(session) = self.write().get_mut(id) {
            session.last_activity_at = now;
        }
    }

    /// End a session. Returns whether a session was removed.
    pub fn terminate(&self, id: &str) -> bool {
        let removed = self.write().remove(id).is_some();
        if removed {
            info!(session_id = %id, "Session terminated");
        } else {
            debug!(session_id = %id, "Terminate for unknown session");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        self.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Remove sessions idle for longer than `max_idle`, returning how many went
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let now = self.clock.now();
        let mut sessions = self.write();
        let before = sessions.len();

        sessions.retain(|_, session| now - session.last_activity_at <= max_idle);

        let removed = before - sessions.len();
        if removed > 0 {
            info!(removed = removed, remaining = sessions.len(), "Expired idle sessions");
        }
        removed
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Session>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
