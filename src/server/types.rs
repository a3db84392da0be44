//! Wire types for the relay HTTP API
//!
//! Field casing follows the public contract: `sessionId` in camelCase,
//! everything else lowercase.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// API version for capability detection
pub const API_VERSION: &str = "2026.8.1";

/// Body of `POST /api/chat`.
///
/// `message` stays optional at the serde layer; the relay maps a missing
/// message to the same 400 as an empty one.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Successful chat reply.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub citations: Vec<Value>,
}
