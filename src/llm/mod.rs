//! Upstream completion backends.
//!
//! The relay talks to the upstream through [`CompletionBackend`] so the HTTP
//! boundary and orchestration never depend on Perplexity directly; tests swap
//! in a mock.

mod perplexity;

pub use perplexity::PerplexityClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One conversation turn as the upstream API sees it. Only role and content
/// are sent; timestamps and everything else stay local.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Result of one completion call
#[derive(Debug, Clone)]
pub struct Completion {
    /// Reply text from the first choice
    pub text: String,
    /// Source citations, passed through verbatim. Empty when the upstream
    /// omits them.
    pub citations: Vec<serde_json::Value>,
}

/// Trait for completion providers - the relay depends only on this
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send the full conversation and get the next reply. Single attempt, no
    /// retries; failures map onto the relay error taxonomy.
    async fn complete(&self, messages: Vec<Message>) -> Result<Completion>;

    /// Short provider name for logs
    fn name(&self) -> &'static str;
}
