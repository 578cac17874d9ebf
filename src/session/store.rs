//! In-memory session store (non-persistent).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::Session;

/// Shared handle to one session. Holding the lock is what makes a cycle
/// exclusive for that session.
pub type SessionHandle = Arc<Mutex<Session>>;

struct SessionEntry {
    handle: SessionHandle,
    last_seen: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a new session seeded with the greeting.
    pub async fn create(&self) -> (Uuid, SessionHandle) {
        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(Session::new(id)));
        self.sessions.write().await.insert(
            id,
            SessionEntry {
                handle: handle.clone(),
                last_seen: Utc::now(),
            },
        );
        tracing::debug!(session_id = %id, "Session created");
        (id, handle)
    }

    /// Look up a session and mark it as recently used.
    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_seen = Utc::now();
        Some(entry.handle.clone())
    }

    /// End a session. Returns false if it did not exist.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            tracing::debug!(session_id = %id, "Session ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle for longer than `ttl`. Sessions in the middle of a
    /// cycle are kept regardless of age.
    pub async fn reap_idle(&self, ttl: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
        else {
            return 0;
        };
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen > cutoff || entry.handle.try_lock().is_err());
        let reaped = before - sessions.len();
        if reaped > 0 {
            tracing::info!(reaped, remaining = sessions.len(), "Reaped idle sessions");
        }
        reaped
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_get_returns_same_session() {
        let store = SessionStore::new();
        let (id, handle) = store.create().await;
        let fetched = store.get(id).await.expect("session exists");
        assert!(Arc::ptr_eq(&handle, &fetched));
        assert_eq!(fetched.lock().await.id, id);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::new();
        let (_, a) = store.create().await;
        let (_, b) = store.create().await;
        a.lock()
            .await
            .transcript
            .push(super::super::Message::user("only in a"));
        assert_eq!(a.lock().await.transcript.len(), 2);
        assert_eq!(b.lock().await.transcript.len(), 1);
    }

    #[tokio::test]
    async fn remove_unknown_session_is_false() {
        let store = SessionStore::new();
        assert!(!store.remove(Uuid::new_v4()).await);
        let (id, _) = store.create().await;
        assert!(store.remove(id).await);
        assert!(store.get(id).await.is_none());
    }

    #[tokio::test]
    async fn reap_keeps_busy_sessions() {
        let store = SessionStore::new();
        let (busy_id, busy) = store.create().await;
        let (idle_id, _) = store.create().await;
        let _guard = busy.lock().await;

        let reaped = store.reap_idle(Duration::ZERO).await;

        assert_eq!(reaped, 1);
        assert!(store.get(busy_id).await.is_some());
        assert!(store.get(idle_id).await.is_none());
    }
}
