// src/session/locks.rs

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

/// Per-session locks serializing concurrent chat calls on the same session.
/// Without this, two simultaneous requests could interleave their
/// read-call-append sequences and produce histories that neither caller sent.
/// Distinct sessions are never blocked by each other.
#[derive(Default)]
pub struct SessionLocks {
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create the lock for a session id. Returns an Arc to the mutex.
    pub async fn get_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        // Fast path: lock already exists
        {
            let locks = self.locks.read().await;
            if let Some(lock) = locks.get(session_id) {
                return lock.clone();
            }
        }

        // Slow path: create lock if needed
        let mut locks = self.locks.write().await;
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop locks nobody currently holds. Called from the eviction sweeper so
    /// the registry does not grow with every session id ever seen.
    pub async fn cleanup_unused(&self) {
        let mut locks = self.locks.write().await;
        // Remove locks that only have one reference (this one)
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_lock_returns_same_arc() {
        let locks = SessionLocks::new();

        let lock1 = locks.get_lock("session-a").await;
        let lock2 = locks.get_lock("session-a").await;

        assert!(Arc::ptr_eq(&lock1, &lock2));
    }

    #[tokio::test]
    async fn test_distinct_sessions_get_distinct_locks() {
        let locks = SessionLocks::new();

        let lock_a = locks.get_lock("session-a").await;
        let lock_b = locks.get_lock("session-b").await;

        assert!(!Arc::ptr_eq(&lock_a, &lock_b));
    }

    #[tokio::test]
    async fn test_same_session_contender_waits_for_release() {
        let locks = Arc::new(SessionLocks::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let lock = locks.get_lock("chat").await;
        let guard = lock.lock().await;

        let contender = {
            let locks = locks.clone();
            let order = order.clone();
            tokio::spawn(async move {
                let lock = locks.get_lock("chat").await;
                let _guard = lock.lock().await;
                order.lock().await.push("contender");
            })
        };

        // The spawned task stays parked on the mutex until the guard drops
        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        order.lock().await.push("holder");
        drop(guard);

        contender.await.unwrap();
        assert_eq!(*order.lock().await, ["holder", "contender"]);
    }

    #[tokio::test]
    async fn test_cleanup_retains_held_locks() {
        let locks = SessionLocks::new();

        let held = locks.get_lock("held").await;
        let _ = locks.get_lock("released").await;
        assert_eq!(locks.len().await, 2);

        locks.cleanup_unused().await;

        assert_eq!(locks.len().await, 1);
        let held_again = locks.get_lock("held").await;
        assert!(Arc::ptr_eq(&held, &held_again));
    }
}
