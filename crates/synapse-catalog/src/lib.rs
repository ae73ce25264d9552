//! Static reference data for the Synapse engine.
//!
//! The catalog is pure data: the cluster vocabularies the generator samples
//! from, the seed constants for cluster metrics, and the default roster of
//! simulated agents. Nothing here mutates.
//!
//! # Modules
//!
//! - [`vocabulary`] -- Zones, topics and event types per cluster, plus
//!   seed metric constants
//! - [`roster`] -- The default agent roster

pub mod roster;
pub mod vocabulary;

pub use roster::{ROSTER, RosterEntry, seed_roster};
pub use vocabulary::{ClusterVocabulary, seed_metric, seed_metrics, vocabulary};
