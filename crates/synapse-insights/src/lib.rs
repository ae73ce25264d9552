//! Derived, read-only views over engine snapshots.
//!
//! Everything here is a pure function of a snapshot: nothing is stored and
//! nothing in the engine is mutated. Consumers call these on demand.
//!
//! # Modules
//!
//! - [`insight`] -- Rule-based archetype tags for one agent
//! - [`narrative`] -- Pulse, hub and deficit sentences over the history

pub mod insight;
pub mod narrative;

pub use insight::{InsightFeatures, InsightRule, MAX_TAGS, RULES, extract_features, insights};
pub use narrative::{AgeBand, deficit, hub, narratives, pulse};
