//! REST API endpoint handlers for the Observer server.
//!
//! All handlers read from the in-memory [`ObservedState`] via the shared
//! [`AppState`]. Insight tags and narratives are computed on request from
//! the same snapshot.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/snapshot` | Latest update plus last fault |
//! | `GET` | `/api/agents` | Roster |
//! | `GET` | `/api/agents/{id}` | Single agent |
//! | `GET` | `/api/agents/{id}/insights` | Archetype tags for one agent |
//! | `GET` | `/api/metrics` | Cluster metrics |
//! | `GET` | `/api/graph` | Connection edges and influencers |
//! | `GET` | `/api/events` | History (by cluster or agent) |
//! | `GET` | `/api/narratives` | Narrative sentences |
//!
//! [`ObservedState`]: crate::state::ObservedState

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use synapse_types::{Cluster, EventLog};

use crate::error::ObserverError;
use crate::state::AppState;

/// Events returned when no `limit` is given.
pub const DEFAULT_EVENT_LIMIT: usize = 100;

/// Upper bound on `limit`.
pub const MAX_EVENT_LIMIT: usize = 1000;

/// Query parameters for the `GET /api/events` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct EventsQuery {
    /// Filter by cluster name (case-insensitive).
    pub cluster: Option<String>,
    /// Filter by agent ID.
    pub agent_id: Option<String>,
    /// Maximum number of events to return (default 100).
    pub limit: Option<usize>,
}

/// Return the latest update together with the last fault, if any.
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snap = state.snapshot.read().await;
    Json(serde_json::json!({
        "update": &snap.update,
        "last_fault": &snap.last_fault,
    }))
}

/// List the roster.
pub async fn list_agents(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snap = state.snapshot.read().await;
    Json(serde_json::json!({
        "count": snap.update.agents.len(),
        "agents": &snap.update.agents,
    }))
}

/// Get a single agent with its strongest cluster.
pub async fn get_agent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let snap = state.snapshot.read().await;
    let agent = snap
        .update
        .agents
        .iter()
        .find(|a| a.id.as_str() == id)
        .ok_or_else(|| ObserverError::NotFound(format!("agent {id}")))?;

    Ok(Json(serde_json::json!({
        "agent": agent,
        "primary_cluster": agent.primary_cluster(),
    })))
}

/// Compute archetype tags for one agent against the current history.
pub async fn get_agent_insights(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let snap = state.snapshot.read().await;
    let agent = snap
        .update
        .agents
        .iter()
        .find(|a| a.id.as_str() == id)
        .ok_or_else(|| ObserverError::NotFound(format!("agent {id}")))?;

    let tags = synapse_insights::insights(agent, &snap.update.history, &snap.update.metrics);
    Ok(Json(serde_json::json!({
        "agent_id": &agent.id,
        "insights": tags,
    })))
}

/// List cluster metrics in catalog order.
pub async fn list_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snap = state.snapshot.read().await;
    Json(serde_json::json!({
        "count": snap.update.metrics.len(),
        "metrics": &snap.update.metrics,
    }))
}

/// Return the published connection graph.
pub async fn get_graph(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snap = state.snapshot.read().await;
    Json(snap.update.graph.clone())
}

/// Query history, newest first.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let cluster = query
        .cluster
        .as_deref()
        .map(str::parse::<Cluster>)
        .transpose()
        .map_err(|e| ObserverError::InvalidQuery(e.to_string()))?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_EVENT_LIMIT)
        .min(MAX_EVENT_LIMIT);

    let snap = state.snapshot.read().await;
    let events: Vec<&EventLog> = snap
        .update
        .history
        .iter()
        .filter(|e| cluster.is_none_or(|c| e.cluster == c))
        .filter(|e| {
            query
                .agent_id
                .as_deref()
                .is_none_or(|id| e.agent_id.as_str() == id)
        })
        .take(limit)
        .collect();

    Ok(Json(serde_json::json!({
        "count": events.len(),
        "events": events,
    })))
}

/// Render every narrative that currently fires.
pub async fn list_narratives(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snap = state.snapshot.read().await;
    let mut rng = SmallRng::from_os_rng();
    let sentences =
        synapse_insights::narratives(&snap.update.history, &snap.update.agents, &mut rng);
    Json(serde_json::json!({
        "count": sentences.len(),
        "narratives": sentences,
    }))
}
