//! Engine control endpoints.
//!
//! Thin REST wrappers over the attached
//! [`EngineHandle`](synapse_core::control::EngineHandle). Each endpoint
//! enqueues one command and answers as soon as it is accepted; the
//! resulting update arrives over the `WebSocket` and the snapshot.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/control/start` | Begin periodic ticking |
//! | `POST` | `/api/control/stop` | Stop periodic ticking |
//! | `POST` | `/api/control/step` | Run one tick |
//! | `POST` | `/api/control/speed` | Change the multiplier |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use synapse_core::control::EngineHandle;
use synapse_types::SetSpeedPayload;
use tracing::info;

use crate::error::ObserverError;
use crate::state::AppState;

/// Response body for control actions.
#[derive(Debug, Serialize)]
pub struct ControlResponse {
    /// Whether the command was accepted.
    pub ok: bool,
    /// Human-readable description.
    pub message: String,
}

fn engine(state: &AppState) -> Result<&EngineHandle, ObserverError> {
    state
        .engine
        .as_ref()
        .ok_or_else(|| ObserverError::Unavailable("no engine attached".to_owned()))
}

fn accepted(message: &str) -> Json<ControlResponse> {
    Json(ControlResponse {
        ok: true,
        message: message.to_owned(),
    })
}

/// Begin periodic ticking.
pub async fn start(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ControlResponse>, ObserverError> {
    engine(&state)?.play()?;
    info!("Engine started via observer API");
    Ok(accepted("engine started"))
}

/// Stop periodic ticking.
pub async fn stop(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ControlResponse>, ObserverError> {
    engine(&state)?.pause()?;
    info!("Engine stopped via observer API");
    Ok(accepted("engine stopped"))
}

/// Run one tick.
pub async fn step(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ControlResponse>, ObserverError> {
    engine(&state)?.step()?;
    Ok(accepted("step queued"))
}

/// Change the playback multiplier.
pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetSpeedPayload>,
) -> Result<Json<ControlResponse>, ObserverError> {
    engine(&state)?.set_speed(body.multiplier)?;
    info!(multiplier = body.multiplier, "Engine speed changed via observer API");
    Ok(Json(ControlResponse {
        ok: true,
        message: format!("speed set to {}x", body.multiplier),
    }))
}
