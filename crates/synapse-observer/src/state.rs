//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the broadcast channel feeding `WebSocket` clients,
//! the latest engine snapshot served by the REST endpoints, and an
//! optional handle to the engine task for control requests.

use std::sync::Arc;

use synapse_core::control::{EngineHandle, UPDATE_CHANNEL_CAPACITY};
use synapse_types::{FaultPayload, OutboundMessage, UpdatePayload};
use tokio::sync::{RwLock, broadcast};

/// Latest engine output as seen by the observer.
#[derive(Debug, Clone, Default)]
pub struct ObservedState {
    /// The most recent `UPDATE` payload.
    pub update: UpdatePayload,
    /// The most recent `FAULT`, cleared by the next update.
    pub last_fault: Option<FaultPayload>,
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast sender for outbound engine messages.
    pub tx: broadcast::Sender<OutboundMessage>,
    /// The latest observed engine output.
    pub snapshot: Arc<RwLock<ObservedState>>,
    /// Handle to the running engine, when one is attached.
    pub engine: Option<EngineHandle>,
}

impl AppState {
    /// Create a new application state with an empty snapshot and no engine.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            tx,
            snapshot: Arc::new(RwLock::new(ObservedState::default())),
            engine: None,
        }
    }

    /// Create a new application state with an engine attached.
    pub fn with_engine(engine: EngineHandle) -> Self {
        Self {
            engine: Some(engine),
            ..Self::new()
        }
    }

    /// Subscribe to the outbound message stream.
    pub fn subscribe(&self) -> broadcast::Receiver<OutboundMessage> {
        self.tx.subscribe()
    }

    /// Publish a message to all connected clients.
    ///
    /// Returns the number of receivers. Zero means no client is connected,
    /// which is not an error.
    pub fn broadcast(&self, message: &OutboundMessage) -> usize {
        self.tx.send(message.clone()).unwrap_or(0)
    }

    /// Fold an engine message into the snapshot, then fan it out.
    pub async fn record(&self, message: &OutboundMessage) -> usize {
        {
            let mut snap = self.snapshot.write().await;
            match message {
                OutboundMessage::Update(update) => {
                    snap.update.clone_from(update);
                    snap.last_fault = None;
                }
                OutboundMessage::Fault(fault) => snap.last_fault = Some(fault.clone()),
            }
        }
        self.broadcast(message)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
