//! Forwarding from the engine task to the Observer API.
//!
//! The bridge subscribes to the engine's outbound stream, folds every
//! message into the observer snapshot, and re-broadcasts it to
//! `WebSocket` clients. Every [`NARRATIVE_LOG_INTERVAL`] ticks it also
//! logs the narratives that currently fire.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use synapse_observer::AppState;
use synapse_types::{OutboundMessage, UpdatePayload};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Ticks between narrative log lines.
pub const NARRATIVE_LOG_INTERVAL: u64 = 10;

/// Spawn the forwarding task. It ends when the engine stream closes.
pub fn spawn(
    mut rx: broadcast::Receiver<OutboundMessage>,
    state: Arc<AppState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = SmallRng::from_os_rng();
        loop {
            match rx.recv().await {
                Ok(message) => {
                    let receivers = state.record(&message).await;
                    match &message {
                        OutboundMessage::Update(update) => {
                            debug!(tick = update.tick, receivers, "Update forwarded");
                            if update.tick.checked_rem(NARRATIVE_LOG_INTERVAL) == Some(0) {
                                log_narratives(update, &mut rng);
                            }
                        }
                        OutboundMessage::Fault(fault) => {
                            warn!(
                                tick = fault.tick,
                                error = %fault.message,
                                "Engine fault forwarded"
                            );
                        }
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    debug!(skipped = n, "Observer bridge lagged, skipping ahead");
                }
                Err(RecvError::Closed) => {
                    info!("Engine stream closed, observer bridge exiting");
                    return;
                }
            }
        }
    })
}

fn log_narratives(update: &UpdatePayload, rng: &mut SmallRng) {
    for sentence in synapse_insights::narratives(&update.history, &update.agents, rng) {
        info!(
            tick = update.tick,
            kind = ?sentence.kind,
            severity = ?sentence.severity,
            "{}",
            sentence.text
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use synapse_core::config::SimulationConfig;
    use synapse_core::control::EngineHandle;
    use synapse_core::tick::Simulation;

    use super::*;

    #[tokio::test]
    async fn updates_reach_snapshot_and_clients() {
        let config = SimulationConfig::default();
        let sim = Simulation::new(&config, SmallRng::seed_from_u64(2)).unwrap();
        let engine = EngineHandle::spawn(sim, config.engine).unwrap();
        let state = Arc::new(AppState::with_engine(engine.clone()));
        let mut client = state.subscribe();
        let _bridge = spawn(engine.subscribe(), Arc::clone(&state));

        engine
            .initialize(synapse_catalog::seed_roster(), synapse_catalog::seed_metrics(), Vec::new())
            .unwrap();

        let message = tokio::time::timeout(Duration::from_secs(1), client.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(message, OutboundMessage::Update(ref u) if u.tick == 1));

        let snap = state.snapshot.read().await;
        assert_eq!(snap.update.tick, 1);
        assert_eq!(snap.update.agents.len(), synapse_catalog::seed_roster().len());
        assert!(!snap.update.history.is_empty());
    }
}
