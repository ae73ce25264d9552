//! Decaying cluster co-occurrence graph.
//!
//! Every cluster switch an agent makes strengthens the link between its old
//! and new cluster by one unit. Every tick all links decay by a fixed factor
//! and links below the prune threshold are forgotten, so the graph reflects
//! recent movement only.

use core::fmt;
use std::collections::BTreeMap;

use synapse_types::{Agent, Cluster, ConnectionEdge, GraphSnapshot};
use tracing::trace;

use crate::config::GraphConfig;
use crate::generator::ClusterSwitch;

/// Unordered pair of distinct clusters, stored in canonical (name-sorted)
/// order so each link has exactly one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterPair {
    first: Cluster,
    second: Cluster,
}

impl ClusterPair {
    /// Canonicalize a pair. Returns `None` for a cluster paired with itself.
    pub fn new(a: Cluster, b: Cluster) -> Option<Self> {
        if a == b {
            return None;
        }
        let (first, second) = if a.name() <= b.name() { (a, b) } else { (b, a) };
        Some(Self { first, second })
    }

    /// Lexicographically smaller cluster.
    pub const fn first(self) -> Cluster {
        self.first
    }

    /// Lexicographically larger cluster.
    pub const fn second(self) -> Cluster {
        self.second
    }
}

impl fmt::Display for ClusterPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

/// Long-lived connection weights plus the rules for decaying them.
#[derive(Debug, Clone)]
pub struct GraphTracker {
    weights: BTreeMap<ClusterPair, f64>,
    config: GraphConfig,
}

impl GraphTracker {
    /// An empty tracker.
    pub const fn new(config: GraphConfig) -> Self {
        Self {
            weights: BTreeMap::new(),
            config,
        }
    }

    /// Forget every connection.
    pub fn clear(&mut self) {
        self.weights.clear();
    }

    /// Raw (un-normalized) weight of a pair, if it is still tracked.
    pub fn weight(&self, pair: ClusterPair) -> Option<f64> {
        self.weights.get(&pair).copied()
    }

    /// Number of tracked connections.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether no connection is tracked.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Record this tick's switches, decay and prune, and derive the
    /// published graph.
    pub fn update(&mut self, switches: &[ClusterSwitch], agents: &[Agent]) -> GraphSnapshot {
        for switch in switches {
            if let Some(pair) = ClusterPair::new(switch.from, switch.to) {
                *self.weights.entry(pair).or_insert(0.0) += 1.0;
            }
        }

        let decay = self.config.decay_factor;
        let threshold = self.config.prune_threshold;
        for weight in self.weights.values_mut() {
            *weight *= decay;
        }
        let before = self.weights.len();
        self.weights.retain(|_, weight| *weight >= threshold);
        trace!(
            pruned = before.saturating_sub(self.weights.len()),
            remaining = self.weights.len(),
            "Graph decayed"
        );

        GraphSnapshot {
            edges: self.edges(),
            influencers: self.influencers(agents),
        }
    }

    /// Surviving connections with weights normalized into `[0, 1]`.
    pub fn edges(&self) -> Vec<ConnectionEdge> {
        let scale = self.config.weight_scale;
        self.weights
            .iter()
            .map(|(pair, weight)| ConnectionEdge {
                source: pair.first(),
                target: pair.second(),
                weight: (weight / scale).clamp(0.0, 1.0),
            })
            .collect()
    }

    /// Names of the most engaged broad-interest agents.
    ///
    /// Only agents with non-zero affinity in more than `min_active_clusters`
    /// clusters qualify. Ranked by `events_attended` descending; the sort is
    /// stable so ties keep roster order.
    pub fn influencers(&self, agents: &[Agent]) -> Vec<String> {
        let mut ranked: Vec<&Agent> = agents
            .iter()
            .filter(|a| a.active_cluster_count() > self.config.min_active_clusters)
            .collect();
        ranked.sort_by(|a, b| b.events_attended.cmp(&a.events_attended));
        ranked
            .into_iter()
            .take(self.config.influencer_count)
            .map(|a| a.name.clone())
            .collect()
    }
}
