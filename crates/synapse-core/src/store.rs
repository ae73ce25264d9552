//! Aggregate store: bounded event history, agent table, cluster metrics.
//!
//! The store is the single writer of engine tables. [`AggregateStore::apply`]
//! turns a batch of generated events into state transitions:
//!
//! - every event is prepended to history (index 0 is always the newest)
//!   and history is truncated to the retention cap
//! - every event increments its cluster's `active_units`
//! - a low-evidence event increments its cluster's `anomalies`
//! - any other event increments the agent's affinity for the cluster and
//!   its `events_attended`, and may unlock a skill milestone
//!
//! Agent and metric rows are never removed.

use std::collections::{BTreeMap, VecDeque};

use synapse_types::{
    Agent, AgentId, Cluster, ClusterMetric, EventLog, EvidenceLevel, InitPayload,
};
use tracing::debug;

/// Affinity milestones that unlock a skill, with the skill title.
pub const SKILL_MILESTONES: [(f64, &str); 3] =
    [(10.0, "Apprentice"), (25.0, "Adept"), (50.0, "Mentor")];

/// Owned deep copy of the store tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    /// Event history, newest first.
    pub history: Vec<EventLog>,
    /// Agents in roster order.
    pub agents: Vec<Agent>,
    /// Metrics in catalog order.
    pub metrics: Vec<ClusterMetric>,
}

/// What a call to [`AggregateStore::apply`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Events applied per cluster.
    pub per_cluster: BTreeMap<Cluster, u32>,
    /// Skills unlocked during the batch.
    pub unlocked_skills: Vec<(AgentId, String)>,
}

/// The engine's mutable tables.
#[derive(Debug, Clone)]
pub struct AggregateStore {
    history: VecDeque<EventLog>,
    agents: Vec<Agent>,
    agent_index: BTreeMap<AgentId, usize>,
    metrics: Vec<ClusterMetric>,
    history_cap: usize,
}

impl AggregateStore {
    /// An empty store with seeded metrics and no agents.
    pub fn new(history_cap: usize) -> Self {
        Self {
            history: VecDeque::new(),
            agents: Vec::new(),
            agent_index: BTreeMap::new(),
            metrics: synapse_catalog::seed_metrics(),
            history_cap: history_cap.max(1),
        }
    }

    /// Replace every table with the contents of an `INIT` payload.
    ///
    /// Agent stats are completed to the full cluster set, missing metric
    /// rows are seeded from the catalog, and history beyond the cap is
    /// dropped (oldest first).
    pub fn load(&mut self, payload: InitPayload) {
        let InitPayload {
            agents,
            metrics,
            history,
        } = payload;

        self.agents = agents;
        for agent in &mut self.agents {
            agent.normalize_stats();
        }
        self.agent_index = self
            .agents
            .iter()
            .enumerate()
            .map(|(i, agent)| (agent.id.clone(), i))
            .collect();

        let mut provided: BTreeMap<Cluster, ClusterMetric> =
            metrics.into_iter().map(|m| (m.name, m)).collect();
        self.metrics = Cluster::ALL
            .into_iter()
            .map(|c| {
                provided
                    .remove(&c)
                    .unwrap_or_else(|| synapse_catalog::seed_metric(c))
            })
            .collect();

        self.history = history.into_iter().take(self.history_cap).collect();

        debug!(
            agents = self.agents.len(),
            history = self.history.len(),
            "Store loaded"
        );
    }

    /// Apply a batch of events given in generation order (oldest first).
    pub fn apply(&mut self, events: Vec<EventLog>) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();

        for event in events {
            let counter = outcome.per_cluster.entry(event.cluster).or_insert(0);
            *counter = counter.saturating_add(1);

            if let Some(metric) = self.metrics.get_mut(event.cluster.index()) {
                metric.active_units = metric.active_units.saturating_add(1);
                if event.evidence == EvidenceLevel::Low {
                    metric.anomalies = metric.anomalies.saturating_add(1);
                }
            }

            if event.evidence != EvidenceLevel::Low {
                if let Some(agent) = self
                    .agent_index
                    .get(&event.agent_id)
                    .and_then(|i| self.agents.get_mut(*i))
                {
                    if let Some(skill) = reinforce(agent, event.cluster) {
                        outcome.unlocked_skills.push((agent.id.clone(), skill));
                    }
                }
            }

            self.history.push_front(event);
        }

        self.history.truncate(self.history_cap);
        outcome
    }

    /// Event history, newest first.
    pub const fn history(&self) -> &VecDeque<EventLog> {
        &self.history
    }

    /// Agents in roster order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Look up one agent.
    pub fn agent(&self, id: &AgentId) -> Option<&Agent> {
        self.agent_index.get(id).and_then(|i| self.agents.get(*i))
    }

    /// Metrics in catalog order.
    pub fn metrics(&self) -> &[ClusterMetric] {
        &self.metrics
    }

    /// Look up one cluster's metric row.
    pub fn metric(&self, cluster: Cluster) -> Option<&ClusterMetric> {
        self.metrics.get(cluster.index())
    }

    /// Configured retention cap.
    pub const fn history_cap(&self) -> usize {
        self.history_cap
    }

    /// Deep copy of all three tables.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            history: self.history.iter().cloned().collect(),
            agents: self.agents.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

/// Credit an agent for a confident interaction. Returns a newly unlocked
/// skill label, if the affinity crossed a milestone.
fn reinforce(agent: &mut Agent, cluster: Cluster) -> Option<String> {
    let before = agent.affinity(cluster);
    let after = before + 1.0;
    agent.stats.insert(cluster, after);
    agent.events_attended = agent.events_attended.saturating_add(1);

    let (_, title) = SKILL_MILESTONES
        .iter()
        .find(|(threshold, _)| before < *threshold && after >= *threshold)?;
    let skill = format!("{cluster} {title}");
    agent.skills.insert(skill.clone()).then_some(skill)
}
