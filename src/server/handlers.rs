//! Request handlers for the relay API

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use super::AppState;
use super::types::{ChatRequest, ChatResponse};
use crate::error::{RelayError, Result};

/// POST /api/chat - forward one user message and return the assistant reply.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let message = request.message.as_deref().unwrap_or("");
    let outcome = state
        .relay
        .handle(message, request.session_id.as_deref())
        .await?;

    Ok(Json(ChatResponse {
        response: outcome.response,
        session_id: outcome.session_id,
        citations: outcome.citations,
    }))
}

/// OPTIONS /api/chat - CORS preflight, answered before any validation.
pub async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

/// Fallback for any other method on /api/chat.
pub async fn method_not_allowed_handler() -> RelayError {
    RelayError::MethodNotAllowed
}

/// GET /api/status - health check.
pub async fn status_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.model,
        "sessions": state.store.len().await,
    }))
}
