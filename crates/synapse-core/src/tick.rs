//! Tick cycle: one step of the Synapse engine.
//!
//! Each tick runs three phases against the state owned by [`Simulation`]:
//!
//! 1. **Generate** -- synthesize a batch of events against the pre-tick
//!    roster ([`generator::generate`]).
//! 2. **Apply** -- hand the events to the [`AggregateStore`], which updates
//!    history, agent affinities, skills and cluster metrics.
//! 3. **Connect** -- feed the batch's cluster switches to the
//!    [`GraphTracker`], which decays, prunes and republishes the graph.
//!
//! The tick is deterministic given the same initial state and the same
//! random source.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand::rngs::SmallRng;
use synapse_types::{AgentId, Cluster, GraphSnapshot, InitPayload, UpdatePayload};
use tracing::{debug, info};

use crate::config::{ConfigError, GenerationConfig, SimulationConfig};
use crate::generator::{self, GeneratedBatch};
use crate::graph::GraphTracker;
use crate::store::AggregateStore;

/// Errors that can escape a tick.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// The generation parameters cannot be sampled from.
    #[error("invalid generation parameters: {source}")]
    Generation {
        /// The underlying validation error.
        source: ConfigError,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Number of events generated.
    pub events: usize,
    /// Number of cluster switches fed to the graph.
    pub switches: usize,
    /// Events generated per cluster.
    pub per_cluster: BTreeMap<Cluster, u32>,
    /// Skills unlocked this tick.
    pub unlocked_skills: Vec<(AgentId, String)>,
    /// History length after the tick.
    pub history_len: usize,
    /// Surviving graph edges after the tick.
    pub edges: usize,
}

/// The whole engine state plus its random source.
///
/// Nothing here is global: several simulations can run side by side, each
/// with its own store, graph and generator.
#[derive(Debug)]
pub struct Simulation<R> {
    tick: u64,
    store: AggregateStore,
    graph: GraphTracker,
    last_graph: GraphSnapshot,
    generation: GenerationConfig,
    rng: R,
}

impl Simulation<SmallRng> {
    /// Build a simulation seeded from `engine.seed`, or from the OS when no
    /// seed is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the graph settings are out of
    /// range.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        let rng = config
            .engine
            .seed
            .map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
        Self::new(config, rng)
    }
}

impl<R: Rng> Simulation<R> {
    /// An empty simulation: no agents, seeded metrics, empty graph.
    ///
    /// Generation parameters are checked on every tick instead, so a bad
    /// value surfaces as a [`TickError`] at the tick boundary.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the graph settings are out of
    /// range.
    pub fn new(config: &SimulationConfig, rng: R) -> Result<Self, ConfigError> {
        config.graph.validate()?;
        Ok(Self {
            tick: 0,
            store: AggregateStore::new(config.engine.history_cap),
            graph: GraphTracker::new(config.graph.clone()),
            last_graph: GraphSnapshot::default(),
            generation: config.generation.clone(),
            rng,
        })
    }

    /// Replace all state with an `INIT` payload. Resets the graph and the
    /// tick counter.
    pub fn load(&mut self, payload: InitPayload) {
        self.store.load(payload);
        self.graph.clear();
        self.last_graph = GraphSnapshot::default();
        self.tick = 0;
        info!(
            agents = self.store.agents().len(),
            history = self.store.history().len(),
            "Simulation loaded"
        );
    }

    /// Execute one complete tick.
    pub fn tick(&mut self) -> Result<TickSummary, TickError> {
        let tick = self.tick.checked_add(1).ok_or(TickError::TickOverflow)?;
        self.generation
            .validate()
            .map_err(|source| TickError::Generation { source })?;

        // --- Phase 1: Generate ---
        let GeneratedBatch { events, switches } =
            generator::generate(self.store.agents(), &self.generation, &mut self.rng);
        let event_count = events.len();

        // --- Phase 2: Apply ---
        let outcome = self.store.apply(events);

        // --- Phase 3: Connect ---
        self.last_graph = self.graph.update(&switches, self.store.agents());

        self.tick = tick;

        for (agent_id, skill) in &outcome.unlocked_skills {
            info!(tick, agent_id = %agent_id, skill = %skill, "Skill unlocked");
        }
        debug!(
            tick,
            events = event_count,
            switches = switches.len(),
            edges = self.last_graph.edges.len(),
            "Tick complete"
        );

        Ok(TickSummary {
            tick,
            events: event_count,
            switches: switches.len(),
            per_cluster: outcome.per_cluster,
            unlocked_skills: outcome.unlocked_skills,
            history_len: self.store.history().len(),
            edges: self.last_graph.edges.len(),
        })
    }

    /// Number of the last completed tick (0 before the first).
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Read access to the aggregate tables.
    pub const fn store(&self) -> &AggregateStore {
        &self.store
    }

    /// Graph published by the last tick.
    pub const fn graph(&self) -> &GraphSnapshot {
        &self.last_graph
    }

    /// Value copy of everything a consumer needs, as sent in `UPDATE`.
    pub fn snapshot(&self) -> UpdatePayload {
        let tables = self.store.snapshot();
        UpdatePayload {
            tick: self.tick,
            history: tables.history,
            agents: tables.agents,
            metrics: tables.metrics,
            graph: self.last_graph.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::collections::BTreeSet;

    use synapse_types::{Agent, ClusterMetric, Role};

    use super::*;

    fn one_event_config() -> SimulationConfig {
        SimulationConfig {
            generation: GenerationConfig {
                min_events_per_tick: 1,
                max_events_per_tick: 1,
                ..GenerationConfig::default()
            },
            ..SimulationConfig::default()
        }
    }

    fn simulation(config: &SimulationConfig, seed: u64) -> Simulation<SmallRng> {
        Simulation::new(config, SmallRng::seed_from_u64(seed)).unwrap()
    }

    fn agent_a() -> Agent {
        Agent {
            id: AgentId::new("agent-a"),
            name: "Agent A".to_owned(),
            role: Role::Participant,
            age: 16,
            stats: [(Cluster::Science, 3.0)].into_iter().collect(),
            events_attended: 0,
            skills: BTreeSet::new(),
        }
    }

    #[test]
    fn load_then_step_produces_one_event_for_the_only_agent() {
        let mut sim = simulation(&one_event_config(), 42);
        sim.load(InitPayload {
            agents: vec![agent_a()],
            metrics: vec![ClusterMetric::new(Cluster::Science, 60.0, 1.2)],
            history: Vec::new(),
        });
        let science_before = sim.store().metric(Cluster::Science).unwrap().active_units;

        let summary = sim.tick().unwrap();
        assert_eq!(summary.tick, 1);
        assert_eq!(summary.events, 1);

        let update = sim.snapshot();
        assert_eq!(update.history.len(), 1);
        let event = update.history.first().unwrap();
        assert_eq!(event.agent_id, AgentId::new("agent-a"));
        assert_eq!(event.agent_name, "Agent A");

        let science_after = sim.store().metric(Cluster::Science).unwrap().active_units;
        let expected_growth = u32::from(event.cluster == Cluster::Science);
        assert_eq!(science_after - science_before, expected_growth);
        assert_eq!(update.metrics.len(), Cluster::ALL.len());
    }

    #[test]
    fn active_units_grow_by_generated_events_per_cluster() {
        let mut sim = simulation(&SimulationConfig::default(), 5);
        sim.load(InitPayload {
            agents: synapse_catalog::seed_roster(),
            ..InitPayload::default()
        });
        for _ in 0..50 {
            let before: Vec<u32> = sim.store().metrics().iter().map(|m| m.active_units).collect();
            let summary = sim.tick().unwrap();
            for (metric, prior) in sim.store().metrics().iter().zip(before) {
                let generated = summary.per_cluster.get(&metric.name).copied().unwrap_or(0);
                assert_eq!(metric.active_units, prior + generated);
            }
        }
    }

    #[test]
    fn history_is_capped_across_many_ticks() {
        let mut config = SimulationConfig::default();
        config.engine.history_cap = 20;
        let mut sim = simulation(&config, 9);
        sim.load(InitPayload {
            agents: synapse_catalog::seed_roster(),
            ..InitPayload::default()
        });
        for _ in 0..100 {
            let summary = sim.tick().unwrap();
            assert!(summary.history_len <= 20);
        }
        assert_eq!(sim.snapshot().history.len(), 20);
    }

    #[test]
    fn empty_engine_ticks_are_no_ops() {
        let mut sim = simulation(&SimulationConfig::default(), 1);
        let summary = sim.tick().unwrap();
        assert_eq!(summary.events, 0);
        let update = sim.snapshot();
        assert_eq!(update.tick, 1);
        assert!(update.history.is_empty());
        assert!(update.agents.is_empty());
        assert!(update.graph.edges.is_empty());
    }

    #[test]
    fn tick_counter_overflow_is_an_error() {
        let mut sim = simulation(&SimulationConfig::default(), 1);
        sim.tick = u64::MAX;
        assert!(matches!(sim.tick(), Err(TickError::TickOverflow)));
        assert_eq!(sim.current_tick(), u64::MAX);
    }

    #[test]
    fn invalid_generation_parameters_fail_the_tick() {
        let mut config = SimulationConfig::default();
        config.generation.explore_probability = 1.5;
        let mut sim = simulation(&config, 1);
        assert!(matches!(sim.tick(), Err(TickError::Generation { .. })));
        assert_eq!(sim.current_tick(), 0);
    }

    #[test]
    fn out_of_range_graph_settings_are_rejected_up_front() {
        let mut config = SimulationConfig::default();
        config.graph.decay_factor = 1.5;
        let result = Simulation::new(&config, SmallRng::seed_from_u64(1));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));

        config.graph.decay_factor = f64::NAN;
        assert!(Simulation::new(&config, SmallRng::seed_from_u64(1)).is_err());
    }

    #[test]
    fn same_seed_same_trajectory() {
        let run = |seed| {
            let mut sim = simulation(&SimulationConfig::default(), seed);
            sim.load(InitPayload {
                agents: synapse_catalog::seed_roster(),
                ..InitPayload::default()
            });
            for _ in 0..30 {
                sim.tick().unwrap();
            }
            let update = sim.snapshot();
            (
                update.agents,
                update.metrics,
                update.graph,
                update
                    .history
                    .iter()
                    .map(|e| (e.agent_id.clone(), e.cluster, e.zone.clone()))
                    .collect::<Vec<_>>(),
            )
        };
        assert_eq!(run(77), run(77));
    }

    #[test]
    fn load_resets_tick_and_graph() {
        let mut sim = simulation(&SimulationConfig::default(), 3);
        sim.load(InitPayload {
            agents: synapse_catalog::seed_roster(),
            ..InitPayload::default()
        });
        for _ in 0..10 {
            sim.tick().unwrap();
        }
        sim.load(InitPayload::default());
        assert_eq!(sim.current_tick(), 0);
        assert!(sim.graph().edges.is_empty());
        assert!(sim.store().history().is_empty());
    }
}
