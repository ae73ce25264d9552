//! Observer API server for the Synapse engine.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/engine`) carrying the engine message
//!   protocol: outbound `UPDATE`/`FAULT` frames, inbound commands
//! - **REST endpoints** for querying the latest snapshot (agents, metrics,
//!   graph, events) plus derived insight tags and narratives
//! - **Control endpoints** (`/api/control/*`) for play, pause, step and
//!   speed changes
//!
//! # Architecture
//!
//! The observer reads from an in-memory [`UpdatePayload`] that the engine
//! binary refreshes on every published update. REST reads never touch the
//! engine task; control requests go through the attached
//! [`EngineHandle`](synapse_core::control::EngineHandle).
//!
//! [`UpdatePayload`]: synapse_types::UpdatePayload

pub mod control;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
