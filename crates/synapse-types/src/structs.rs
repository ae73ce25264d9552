//! Core entity structs for the Synapse engine.
//!
//! [`Agent`], [`EventLog`] and [`ClusterMetric`] make up the aggregate
//! store tables. [`ConnectionEdge`], [`GraphSnapshot`], [`InsightTag`] and
//! [`NarrativeInsight`] are derived values recomputed on demand.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Action, Cluster, EvidenceLevel, NarrativeKind, Role, Severity};
use crate::ids::{AgentId, EventId};

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A simulated participant and its per-cluster affinity profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Agent {
    /// Roster identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Role at the event.
    pub role: Role,
    /// Age in years.
    pub age: u32,
    /// Affinity per cluster. Keys are always exactly [`Cluster::ALL`].
    pub stats: BTreeMap<Cluster, f64>,
    /// Number of non-low-evidence events attributed to this agent.
    pub events_attended: u32,
    /// Skill labels unlocked by affinity milestones.
    pub skills: BTreeSet<String>,
}

impl Agent {
    /// Current affinity for a cluster (0 when absent).
    pub fn affinity(&self, cluster: Cluster) -> f64 {
        self.stats.get(&cluster).copied().unwrap_or(0.0)
    }

    /// The cluster with the highest affinity.
    ///
    /// Ties resolve to the earliest cluster in catalog order. Returns `None`
    /// only when the stats map is empty.
    pub fn primary_cluster(&self) -> Option<Cluster> {
        let mut best: Option<(Cluster, f64)> = None;
        for cluster in Cluster::ALL {
            let Some(value) = self.stats.get(&cluster).copied() else {
                continue;
            };
            match best {
                Some((_, top)) if value <= top => {}
                _ => best = Some((cluster, value)),
            }
        }
        best.map(|(cluster, _)| cluster)
    }

    /// Number of clusters with a non-zero affinity.
    pub fn active_cluster_count(&self) -> usize {
        self.stats.values().filter(|v| **v > 0.0).count()
    }

    /// Make the stats keys exactly the catalog cluster set, filling any
    /// missing cluster with zero.
    pub fn normalize_stats(&mut self) {
        for cluster in Cluster::ALL {
            self.stats.entry(cluster).or_insert(0.0);
        }
    }
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// One synthesized interaction. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventLog {
    /// Unique event identifier.
    pub id: EventId,
    /// When the event was synthesized.
    pub created_at: DateTime<Utc>,
    /// The agent the event is attributed to.
    pub agent_id: AgentId,
    /// The agent's display name at creation time.
    pub agent_name: String,
    /// The cluster interacted with.
    pub cluster: Cluster,
    /// Venue or context label.
    pub zone: String,
    /// Signal confidence.
    pub evidence: EvidenceLevel,
    /// What the agent did.
    pub action: Action,
    /// Topic label from the cluster vocabulary.
    pub topic: Option<String>,
    /// Event-type label from the cluster vocabulary.
    pub event_type: Option<String>,
    /// Simulated mental effort, 0 to 10.
    pub cognitive_load: f64,
    /// Simulated response latency in milliseconds.
    pub latency_ms: u32,
}

// ---------------------------------------------------------------------------
// ClusterMetric
// ---------------------------------------------------------------------------

/// Rollup counters for one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ClusterMetric {
    /// The cluster this row describes.
    pub name: Cluster,
    /// Number of events that targeted the cluster. Never decreases.
    pub active_units: u32,
    /// Coverage percentage (seed-time constant).
    pub coverage: f64,
    /// Return-on-investment score (seed-time constant).
    pub roi: f64,
    /// Number of low-evidence events seen on the cluster.
    pub anomalies: u32,
}

impl ClusterMetric {
    /// A fresh row with zeroed counters.
    pub const fn new(name: Cluster, coverage: f64, roi: f64) -> Self {
        Self {
            name,
            active_units: 0,
            coverage,
            roi,
            anomalies: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Graph output
// ---------------------------------------------------------------------------

/// A decaying link between two clusters derived from agent cluster switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ConnectionEdge {
    /// First cluster of the canonical pair.
    pub source: Cluster,
    /// Second cluster of the canonical pair.
    pub target: Cluster,
    /// Weight normalized into `[0, 1]`.
    pub weight: f64,
}

/// Graph tracker output published with every update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GraphSnapshot {
    /// Surviving connection edges.
    pub edges: Vec<ConnectionEdge>,
    /// Names of the current influencers, strongest first.
    pub influencers: Vec<String>,
}

// ---------------------------------------------------------------------------
// Insight and narrative output
// ---------------------------------------------------------------------------

/// A behavioral archetype label computed for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InsightTag {
    /// Short label.
    pub label: String,
    /// One-sentence explanation.
    pub description: String,
    /// Display color as a CSS hex string.
    pub color: String,
}

/// A templated sentence summarizing a global condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NarrativeInsight {
    /// Which detector produced the sentence.
    pub kind: NarrativeKind,
    /// Severity band.
    pub severity: Severity,
    /// The rendered sentence.
    pub text: String,
    /// The cluster the sentence is about, when there is one.
    pub cluster: Option<Cluster>,
}
