// src/relay.rs
// Core chat orchestration: session resolution, history append, the single
// upstream call, and the reply append.

use std::sync::Arc;

use tracing::{Span, info, instrument, warn};
use uuid::Uuid;

use crate::error::{RelayError, Result};
use crate::llm::{CompletionBackend, Message};
use crate::session::{ChatMessage, SessionLocks, SessionStore};

/// Outcome of one successful chat exchange
#[derive(Debug, Clone)]
pub struct RelayOutcome {
    /// Reply text from the upstream model
    pub response: String,
    /// Identifier of the session the exchange was recorded under. Callers
    /// send this back to continue the conversation.
    pub session_id: String,
    /// Citations passed through from the upstream, possibly empty
    pub citations: Vec<serde_json::Value>,
}

pub struct SessionRelay {
    store: Arc<SessionStore>,
    locks: Arc<SessionLocks>,
    backend: Arc<dyn CompletionBackend>,
}

impl SessionRelay {
    pub fn new(
        store: Arc<SessionStore>,
        locks: Arc<SessionLocks>,
        backend: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            store,
            locks,
            backend,
        }
    }

    /// Handle one chat exchange.
    ///
    /// Appends the user message to the session (created lazily; a missing or
    /// empty `session_id` gets a fresh UUID), sends the full history upstream
    /// once, appends the reply, and returns it. On upstream failure the user
    /// message stays in the history; there is no rollback and no retry.
    #[instrument(skip(self, message, session_id), fields(session))]
    pub async fn handle(&self, message: &str, session_id: Option<&str>) -> Result<RelayOutcome> {
        // Only a truly empty message is invalid; whitespace passes through
        if message.is_empty() {
            return Err(RelayError::EmptyMessage);
        }

        // An empty id is treated the same as an absent one
        let id = match session_id.filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        Span::current().record("session", id.as_str());

        // Serialize concurrent exchanges on the same session; distinct
        // sessions proceed in parallel
        let lock = self.locks.get_lock(&id).await;
        let _guard = lock.lock().await;

        self.store.get_or_create(&id).await;
        self.store.append(&id, ChatMessage::user(message)).await;

        let history = self.store.history(&id).await.unwrap_or_default();
        let message_count = history.len();
        let messages: Vec<Message> = history
            .into_iter()
            .map(|m| Message::new(m.role.to_string(), m.content))
            .collect();

        info!(
            session = %id,
            message_count,
            backend = self.backend.name(),
            "forwarding chat exchange"
        );

        let completion = match self.backend.complete(messages).await {
            Ok(completion) => completion,
            Err(err) => {
                warn!(
                    session = %id,
                    backend = self.backend.name(),
                    error = %err,
                    "completion failed; user message retained"
                );
                return Err(err);
            }
        };

        self.store
            .append(&id, ChatMessage::assistant(completion.text.clone()))
            .await;

        Ok(RelayOutcome {
            response: completion.text,
            session_id: id,
            citations: completion.citations,
        })
    }
}
