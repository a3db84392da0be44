//! In-memory conversation sessions.
//!
//! A session is an identifier plus an append-only message history. Sessions are
//! created lazily on first use, live for the life of the process, and are only
//! ever dropped by the optional eviction sweeper.

mod locks;
mod store;
mod sweeper;

pub use locks::SessionLocks;
pub use store::SessionStore;
pub use sweeper::spawn_eviction_sweeper;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Caller-sent message
    User,
    /// Model reply
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A chat message in session history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A conversation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque unique identifier. Caller-supplied values are trusted verbatim.
    pub id: String,
    /// Ordered history. Append-only; never reordered or deduplicated.
    pub messages: Vec<ChatMessage>,
    /// Set once at creation, immutable afterwards.
    pub created_at: DateTime<Utc>,
    /// Bumped on every append. Read only by the eviction sweeper.
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            messages: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }
}
