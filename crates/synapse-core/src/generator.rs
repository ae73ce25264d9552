//! Event synthesis.
//!
//! Each tick the generator draws between `min_events_per_tick` and
//! `max_events_per_tick` interaction events. For every event it picks an
//! agent uniformly, starts from the agent's primary (arg-max affinity)
//! cluster, and with probability `explore_probability` replaces it with a
//! uniformly random cluster. The rest of the event is sampled from the
//! catalog vocabulary of the chosen cluster.
//!
//! The generator never mutates anything. It reads the pre-tick roster and
//! returns a [`GeneratedBatch`]; the [`AggregateStore`] applies it.
//!
//! [`AggregateStore`]: crate::store::AggregateStore

use chrono::Utc;
use rand::Rng;
use rand::seq::IndexedRandom;
use synapse_types::{Action, Agent, AgentId, Cluster, EventId, EventLog, EvidenceLevel};

use crate::config::GenerationConfig;

/// Above this first draw the evidence is [`EvidenceLevel::Low`].
const LOW_EVIDENCE_CUTOFF: f64 = 0.8;

/// Above this second draw the evidence is [`EvidenceLevel::High`].
const HIGH_EVIDENCE_CUTOFF: f64 = 0.5;

/// Upper bound of the cognitive load scale.
const MAX_COGNITIVE_LOAD: f64 = 10.0;

/// An agent interacted with a cluster other than its primary cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSwitch {
    /// The agent that switched.
    pub agent_id: AgentId,
    /// The agent's pre-tick primary cluster.
    pub from: Cluster,
    /// The cluster the event targeted.
    pub to: Cluster,
}

/// Output of one generator invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedBatch {
    /// New events, in generation order (oldest first).
    pub events: Vec<EventLog>,
    /// Cluster switches observed while generating.
    pub switches: Vec<ClusterSwitch>,
}

/// Synthesize one tick's worth of events against the given roster.
///
/// Returns an empty batch when the roster is empty.
pub fn generate<R: Rng + ?Sized>(
    agents: &[Agent],
    config: &GenerationConfig,
    rng: &mut R,
) -> GeneratedBatch {
    let mut batch = GeneratedBatch::default();
    if agents.is_empty() {
        return batch;
    }

    let max = config.max_events_per_tick.max(config.min_events_per_tick);
    let count = rng.random_range(config.min_events_per_tick..=max);

    for _ in 0..count {
        let Some(agent) = agents.choose(rng) else {
            break;
        };
        let primary = agent.primary_cluster();
        let cluster = choose_cluster(primary, config.explore_probability, rng);

        match primary {
            Some(from) if from != cluster => batch.switches.push(ClusterSwitch {
                agent_id: agent.id.clone(),
                from,
                to: cluster,
            }),
            _ => {}
        }

        batch.events.push(synthesize_event(agent, cluster, config, rng));
    }

    batch
}

/// Keep the primary cluster, or explore a random one.
fn choose_cluster<R: Rng + ?Sized>(
    primary: Option<Cluster>,
    explore_probability: f64,
    rng: &mut R,
) -> Cluster {
    let explore = rng.random::<f64>() < explore_probability;
    match primary {
        Some(cluster) if !explore => cluster,
        _ => random_cluster(rng),
    }
}

fn random_cluster<R: Rng + ?Sized>(rng: &mut R) -> Cluster {
    Cluster::ALL
        .choose(rng)
        .copied()
        .unwrap_or(Cluster::Science)
}

/// Two independent uniform draws: Low above 0.8, then High above 0.5.
pub fn sample_evidence<R: Rng + ?Sized>(rng: &mut R) -> EvidenceLevel {
    if rng.random::<f64>() > LOW_EVIDENCE_CUTOFF {
        EvidenceLevel::Low
    } else if rng.random::<f64>() > HIGH_EVIDENCE_CUTOFF {
        EvidenceLevel::High
    } else {
        EvidenceLevel::Medium
    }
}

fn synthesize_event<R: Rng + ?Sized>(
    agent: &Agent,
    cluster: Cluster,
    config: &GenerationConfig,
    rng: &mut R,
) -> EventLog {
    let vocab = synapse_catalog::vocabulary(cluster);
    let evidence = sample_evidence(rng);
    let zone = vocab.zones.choose(rng).copied().unwrap_or_default();
    let action = Action::ALL.choose(rng).copied().unwrap_or(Action::Observe);
    let topic = vocab.topics.choose(rng).map(|t| (*t).to_owned());
    let event_type = vocab.event_types.choose(rng).map(|t| (*t).to_owned());

    let raw_load: f64 = rng.random_range(0.0..=MAX_COGNITIVE_LOAD);
    let cognitive_load = (raw_load * 10.0).round() / 10.0;

    let latency_max = config.latency_max_ms.max(config.latency_min_ms);
    let latency_ms = rng.random_range(config.latency_min_ms..=latency_max);

    EventLog {
        id: EventId::new(),
        created_at: Utc::now(),
        agent_id: agent.id.clone(),
        agent_name: agent.name.clone(),
        cluster,
        zone: zone.to_owned(),
        evidence,
        action,
        topic,
        event_type,
        cognitive_load,
        latency_ms,
    }
}
