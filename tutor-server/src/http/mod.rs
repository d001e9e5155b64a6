//! HTTP server module

mod api;
mod sessions;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::ws::ws_handler;

pub use api::HealthResponse;
pub use sessions::{
    AttentionEventRequest, CreateSessionRequest, PedagogyStatusResponse, PhaseRequest,
};

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/sessions", post(sessions::create_session))
        .route("/api/sessions/:id", get(sessions::get_session))
        .route("/api/sessions/:id/start", post(sessions::start_session))
        .route("/api/sessions/:id/complete", post(sessions::complete_session))
        .route(
            "/api/sessions/:id/attention-event",
            post(sessions::create_attention_event),
        )
        .route(
            "/api/sessions/:id/attention-summary",
            get(sessions::attention_summary),
        )
        .route("/api/sessions/:id/phase", post(sessions::advance_phase))
        .route(
            "/api/sessions/:id/pedagogy-status",
            get(sessions::pedagogy_status),
        )
        .route("/api/sessions/:id/messages", get(sessions::list_messages))
        .route("/ws", get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
