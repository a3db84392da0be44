// src/session/sweeper.rs
//! Background eviction for the session store.
//!
//! Runs on an interval and applies the configured limits: idle sessions past
//! the ttl are dropped first, then the store is trimmed to capacity by
//! least-recent activity. With both limits disabled nothing is ever evicted
//! and main never spawns this task.

use std::sync::Arc;

use tracing::info;

use crate::config::SessionConfig;

use super::{SessionLocks, SessionStore};

/// Spawn the background eviction task.
pub fn spawn_eviction_sweeper(
    store: Arc<SessionStore>,
    locks: Arc<SessionLocks>,
    config: SessionConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let interval = config.sweep_interval();
        loop {
            run_sweep(&store, &locks, &config).await;
            tokio::time::sleep(interval).await;
        }
    })
}

/// One eviction pass. Safe to run at any time.
pub async fn run_sweep(
    store: &SessionStore,
    locks: &SessionLocks,
    config: &SessionConfig,
) -> usize {
    let mut removed = 0;

    if let Some(ttl) = config.ttl() {
        removed += store.sweep_expired(ttl).await;
    }
    if let Some(max) = config.capacity() {
        removed += store.trim_to_capacity(max).await;
    }
    locks.cleanup_unused().await;

    if removed > 0 {
        let remaining = store.len().await;
        info!(removed, remaining, "evicted idle sessions");
    }
    removed
}
