//! HTTP boundary for the relay
//!
//! Exposes the chat relay via REST endpoints:
//! - POST /api/chat - forward a message, get the assistant reply
//! - GET  /api/status - health check
//!
//! OPTIONS on /api/chat answers 200 with no body; any other method on that
//! path gets a 405 with a JSON error body.

mod handlers;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::relay::SessionRelay;
use crate::session::SessionStore;

pub use types::{API_VERSION, ChatRequest, ChatResponse};

// ============================================================================
// Server State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<SessionRelay>,
    pub store: Arc<SessionStore>,
    /// Upstream model name, reported by /api/status.
    pub model: String,
}

// ============================================================================
// Routes
// ============================================================================

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    // API version header on all responses
    let version_header = SetResponseHeaderLayer::if_not_present(
        header::HeaderName::from_static("x-api-version"),
        HeaderValue::from_static(API_VERSION),
    );

    Router::new()
        .route(
            "/api/chat",
            post(handlers::chat_handler)
                .options(handlers::preflight_handler)
                .fallback(handlers::method_not_allowed_handler),
        )
        .route("/api/status", get(handlers::status_handler))
        .layer(TraceLayer::new_for_http())
        .layer(version_header)
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server until the task is cancelled or the listener fails.
pub async fn run(config: &ServerConfig, state: AppState) -> Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(addr = %listener.local_addr()?, "relay listening");

    axum::serve(listener, app).await?;

    Ok(())
}
