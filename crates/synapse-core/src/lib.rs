//! Tick engine for the Synapse simulation.
//!
//! This crate owns every piece of mutable engine state and the single task
//! that drives it: event synthesis, the aggregate store, the decaying
//! cluster graph, and the control surface consumers talk to.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `synapse-config.yaml` into
//!   strongly-typed structs.
//! - [`generator`] -- Affinity-biased event synthesis.
//! - [`store`] -- Bounded history, agent table, and cluster metrics.
//! - [`graph`] -- Cluster co-occurrence weights, decay, and influencers.
//! - [`tick`] -- [`Simulation`], one engine instance and its tick cycle.
//! - [`control`] -- [`EngineHandle`], the message-passing control surface.
//!
//! [`Simulation`]: tick::Simulation
//! [`EngineHandle`]: control::EngineHandle

pub mod config;
pub mod control;
pub mod generator;
pub mod graph;
pub mod store;
pub mod tick;
