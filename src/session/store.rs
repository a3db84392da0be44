// src/session/store.rs
// Thread-safe in-memory session store. Deliberately process-local: restarts
// drop all history, and nothing is shared across instances.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;

use super::{ChatMessage, Session};

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch the session for `id`, creating an empty one if it does not exist.
    /// Returns a snapshot of its current state.
    pub async fn get_or_create(&self, id: &str) -> Session {
        // Fast path: session already exists
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(id) {
                return session.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id.to_string())
            .or_insert_with(|| Session::new(id))
            .clone()
    }

    /// Append a message to a session's history and bump its activity
    /// timestamp, creating the session if it does not exist. Returns the new
    /// history length.
    pub async fn append(&self, id: &str, message: ChatMessage) -> usize {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| Session::new(id));
        session.messages.push(message);
        session.last_activity = Utc::now();
        session.messages.len()
    }

    pub async fn get(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    /// Snapshot of a session's ordered history.
    pub async fn history(&self, id: &str) -> Option<Vec<ChatMessage>> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|s| s.messages.clone())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle for longer than `ttl`. Returns how many were removed.
    pub async fn sweep_expired(&self, ttl: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero());
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_activity >= cutoff);
        before - sessions.len()
    }

    /// Drop least-recently-active sessions until at most `max` remain. Returns
    /// how many were removed.
    pub async fn trim_to_capacity(&self, max: usize) -> usize {
        let mut sessions = self.sessions.write().await;
        if sessions.len() <= max {
            return 0;
        }

        let excess = sessions.len() - max;
        let mut by_activity: Vec<(String, chrono::DateTime<Utc>)> = sessions
            .iter()
            .map(|(id, session)| (id.clone(), session.last_activity))
            .collect();
        by_activity.sort_by_key(|(_, activity)| *activity);

        for (id, _) in by_activity.into_iter().take(excess) {
            sessions.remove(&id);
        }
        excess
    }

    /// Shift a session's activity timestamp into the past. Test hook for
    /// exercising the eviction paths without real waiting.
    #[cfg(test)]
    pub(crate) async fn backdate_activity(&self, id: &str, seconds: i64) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(id) {
            session.last_activity = Utc::now() - chrono::Duration::seconds(seconds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Role;
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_creates_once() {
        let store = SessionStore::new();

        let first = store.get_or_create("abc").await;
        assert_eq!(first.id, "abc");
        assert!(first.messages.is_empty());

        let second = store.get_or_create("abc").await;
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_append_preserves_order() {
        let store = SessionStore::new();
        store.get_or_create("abc").await;

        assert_eq!(store.append("abc", ChatMessage::user("first")).await, 1);
        assert_eq!(store.append("abc", ChatMessage::assistant("second")).await, 2);
        assert_eq!(store.append("abc", ChatMessage::user("third")).await, 3);

        let history = store.history("abc").await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "first");
        assert_eq!(history[1].content, "second");
        assert_eq!(history[2].content, "third");
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_append_creates_missing_session() {
        let store = SessionStore::new();
        assert_eq!(store.append("fresh", ChatMessage::user("hi")).await, 1);

        let session = store.get("fresh").await.unwrap();
        assert_eq!(session.id, "fresh");
        assert_eq!(session.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_append_bumps_activity() {
        let store = SessionStore::new();
        let created = store.get_or_create("abc").await;

        tokio::time::sleep(Duration::from_millis(5)).await;
        store.append("abc", ChatMessage::user("hi")).await;

        let session = store.get("abc").await.unwrap();
        assert!(session.last_activity > created.last_activity);
        assert_eq!(session.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_contains_and_get() {
        let store = SessionStore::new();
        assert!(!store.contains("abc").await);
        assert!(store.get("abc").await.is_none());

        store.get_or_create("abc").await;
        assert!(store.contains("abc").await);
        assert!(store.get("abc").await.is_some());
    }

    #[tokio::test]
    async fn test_sweep_expired() {
        let store = SessionStore::new();
        store.get_or_create("old").await;
        store.get_or_create("fresh").await;
        store.backdate_activity("old", 120).await;

        let removed = store.sweep_expired(Duration::from_secs(60)).await;
        assert_eq!(removed, 1);
        assert!(!store.contains("old").await);
        assert!(store.contains("fresh").await);
    }

    #[tokio::test]
    async fn test_sweep_keeps_everything_within_ttl() {
        let store = SessionStore::new();
        store.get_or_create("a").await;
        store.get_or_create("b").await;

        let removed = store.sweep_expired(Duration::from_secs(3600)).await;
        assert_eq!(removed, 0);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_trim_to_capacity_drops_least_recent() {
        let store = SessionStore::new();
        store.get_or_create("a").await;
        store.get_or_create("b").await;
        store.get_or_create("c").await;

        // Make "b" the most recently active, "a" the least
        store.backdate_activity("a", 300).await;
        store.backdate_activity("c", 100).await;

        let removed = store.trim_to_capacity(1).await;
        assert_eq!(removed, 2);
        assert!(store.contains("b").await);
        assert!(!store.contains("a").await);
        assert!(!store.contains("c").await);
    }

    #[tokio::test]
    async fn test_trim_under_capacity_is_noop() {
        let store = SessionStore::new();
        store.get_or_create("a").await;

        assert_eq!(store.trim_to_capacity(10).await, 0);
        assert_eq!(store.len().await, 1);
    }
}
