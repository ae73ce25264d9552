//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST, control and `WebSocket`) into a single
//! [`Router`] with CORS and HTTP tracing middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{control, handlers, ws};

/// Build the complete Axum router for the Observer server.
///
/// CORS allows any origin so the dashboard can be served from elsewhere.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket
        .route("/ws/engine", get(ws::ws_engine))
        // Read API
        .route("/api/snapshot", get(handlers::get_snapshot))
        .route("/api/agents", get(handlers::list_agents))
        .route("/api/agents/{id}", get(handlers::get_agent))
        .route("/api/agents/{id}/insights", get(handlers::get_agent_insights))
        .route("/api/metrics", get(handlers::list_metrics))
        .route("/api/graph", get(handlers::get_graph))
        .route("/api/events", get(handlers::list_events))
        .route("/api/narratives", get(handlers::list_narratives))
        // Control
        .route("/api/control/start", post(control::start))
        .route("/api/control/stop", post(control::stop))
        .route("/api/control/step", post(control::step))
        .route("/api/control/speed", post(control::set_speed))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
