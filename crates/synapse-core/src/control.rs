//! Engine control surface.
//!
//! The engine runs as a single tokio task that owns a [`Simulation`].
//! [`EngineHandle`] is the only way in: it forwards validated
//! [`InboundMessage`] commands over a bounded ordered channel and hands
//! out broadcast receivers for the [`OutboundMessage`] stream. A full
//! command queue rejects the command instead of buffering without limit.
//!
//! # State machine
//!
//! | Command     | Stopped                          | Running                       |
//! |-------------|----------------------------------|-------------------------------|
//! | `INIT`      | load, tick once (arm if auto)    | load, tick once               |
//! | `START`     | arm the timer                    | no-op                         |
//! | `STOP`      | no-op                            | disarm the timer              |
//! | `SET_SPEED` | remember the multiplier          | re-arm at the new period      |
//! | `STEP`      | tick once                        | tick once, timer untouched    |
//!
//! The periodic timer and manual steps are served by the same `select!`
//! loop, so two ticks never interleave. Re-arming replaces the interval in
//! place; the first tick after arming fires one full period later.

use core::future;

use rand::Rng;
use synapse_types::{
    Agent, ClusterMetric, EventLog, FaultPayload, InboundMessage, InitPayload, OutboundMessage,
    ProtocolError, SetSpeedPayload, UpdatePayload,
};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::tick::Simulation;

/// Capacity of the outbound broadcast channel.
///
/// A subscriber that falls further behind receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest
/// snapshot. Each snapshot replaces the previous one, so nothing is lost.
pub const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Commands that may wait in the engine inbox before senders are refused.
pub const COMMAND_QUEUE_CAPACITY: usize = 64;

/// Errors returned by [`EngineHandle`] commands.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// The engine task has exited.
    #[error("engine task is no longer running")]
    Closed,

    /// The command queue is full; the command was dropped.
    #[error("engine command queue is full")]
    Busy,

    /// The command failed validation and was not sent.
    #[error("rejected command: {source}")]
    Protocol {
        /// The underlying validation error.
        #[from]
        source: ProtocolError,
    },
}

/// Cloneable handle to a running engine task.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<InboundMessage>,
    updates: broadcast::Sender<OutboundMessage>,
}

impl EngineHandle {
    /// Spawn the engine task on the current tokio runtime.
    ///
    /// The task runs until every handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the scheduler settings are out
    /// of range; nothing is spawned in that case.
    pub fn spawn<R>(simulation: Simulation<R>, config: EngineConfig) -> Result<Self, ConfigError>
    where
        R: Rng + Send + 'static,
    {
        config.validate()?;
        let (commands, inbox) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        let actor = EngineActor {
            multiplier: config.speed_multiplier,
            simulation,
            inbox,
            updates: updates.clone(),
            config,
            timer: None,
        };
        tokio::spawn(actor.run());

        Ok(Self { commands, updates })
    }

    /// Validate and enqueue a protocol command.
    pub fn send(&self, message: InboundMessage) -> Result<(), ControlError> {
        if let Err(source) = message.validate() {
            warn!(command = message.tag(), error = %source, "Rejected engine command");
            return Err(source.into());
        }
        self.commands.try_send(message).map_err(|e| match e {
            TrySendError::Full(message) => {
                warn!(command = message.tag(), "Engine command queue full, dropping command");
                ControlError::Busy
            }
            TrySendError::Closed(_) => ControlError::Closed,
        })
    }

    /// Load roster, metrics and history; the engine ticks once right after.
    pub fn initialize(
        &self,
        agents: Vec<Agent>,
        metrics: Vec<ClusterMetric>,
        history: Vec<EventLog>,
    ) -> Result<(), ControlError> {
        self.send(InboundMessage::Init(InitPayload {
            agents,
            metrics,
            history,
        }))
    }

    /// Begin periodic ticking.
    pub fn play(&self) -> Result<(), ControlError> {
        self.send(InboundMessage::Start)
    }

    /// Stop periodic ticking.
    pub fn pause(&self) -> Result<(), ControlError> {
        self.send(InboundMessage::Stop)
    }

    /// Change the playback multiplier.
    pub fn set_speed(&self, multiplier: f64) -> Result<(), ControlError> {
        self.send(InboundMessage::SetSpeed(SetSpeedPayload { multiplier }))
    }

    /// Run exactly one tick.
    pub fn step(&self) -> Result<(), ControlError> {
        self.send(InboundMessage::Step)
    }

    /// Receive every message published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<OutboundMessage> {
        self.updates.subscribe()
    }

    /// Invoke `callback` once per `UPDATE`, on a dedicated task.
    ///
    /// The subscription is taken before this returns, so no update sent
    /// afterwards is missed. The task ends when the engine task exits.
    pub fn on_update<F>(&self, mut callback: F) -> JoinHandle<()>
    where
        F: FnMut(&UpdatePayload) + Send + 'static,
    {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(OutboundMessage::Update(update)) => callback(&update),
                    Ok(OutboundMessage::Fault(_)) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        debug!(skipped = n, "Update callback lagged, skipping ahead");
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        })
    }

    /// Whether the engine task has exited.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

/// State owned by the engine task.
struct EngineActor<R> {
    simulation: Simulation<R>,
    inbox: mpsc::Receiver<InboundMessage>,
    updates: broadcast::Sender<OutboundMessage>,
    config: EngineConfig,
    multiplier: f64,
    timer: Option<Interval>,
}

impl<R: Rng> EngineActor<R> {
    async fn run(mut self) {
        info!(
            base_tick_interval_ms = self.config.base_tick_interval_ms,
            multiplier = self.multiplier,
            "Engine task started"
        );

        loop {
            tokio::select! {
                command = self.inbox.recv() => {
                    match command {
                        Some(command) => self.handle(command),
                        None => break,
                    }
                }
                () = next_tick(&mut self.timer) => self.tick_and_publish(),
            }
        }

        info!(tick = self.simulation.current_tick(), "Engine task stopped");
    }

    fn handle(&mut self, command: InboundMessage) {
        debug!(command = command.tag(), "Engine command");
        match command {
            InboundMessage::Init(payload) => {
                self.simulation.load(payload);
                if self.config.auto_start && self.timer.is_none() {
                    self.arm();
                }
                self.tick_and_publish();
            }
            InboundMessage::Start => {
                if self.timer.is_none() {
                    self.arm();
                }
            }
            InboundMessage::Stop => {
                if self.timer.take().is_some() {
                    info!(tick = self.simulation.current_tick(), "Engine paused");
                }
            }
            InboundMessage::SetSpeed(SetSpeedPayload { multiplier }) => {
                if !multiplier.is_finite() || multiplier <= 0.0 {
                    warn!(multiplier, "Ignoring invalid speed multiplier");
                    return;
                }
                self.multiplier = multiplier;
                if self.timer.is_some() {
                    self.arm();
                } else {
                    debug!(multiplier, "Speed stored for next start");
                }
            }
            InboundMessage::Step => self.tick_and_publish(),
        }
    }

    /// Install a fresh interval at the current speed, replacing any old one.
    fn arm(&mut self) {
        let period = self.config.tick_interval(self.multiplier);
        let now = Instant::now();
        let first = now.checked_add(period).unwrap_or(now);
        let mut interval = tokio::time::interval_at(first, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(interval);
        let period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
        info!(period_ms, multiplier = self.multiplier, "Engine running");
    }

    fn tick_and_publish(&mut self) {
        let message = match self.simulation.tick() {
            Ok(summary) => {
                trace!(tick = summary.tick, events = summary.events, "Publishing update");
                OutboundMessage::Update(self.simulation.snapshot())
            }
            Err(e) => {
                let tick = self.simulation.current_tick();
                error!(tick, error = %e, "Tick failed, stopping the timer");
                self.timer = None;
                OutboundMessage::Fault(FaultPayload {
                    tick,
                    message: e.to_string(),
                })
            }
        };
        // Err only means nobody is subscribed right now.
        let receivers = self.updates.send(message).unwrap_or(0);
        trace!(receivers, "Message published");
    }
}

/// Resolve on the next timer tick, or never when the timer is disarmed.
async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending::<()>().await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::arithmetic_side_effects)]
mod tests {
    use std::collections::BTreeSet;
    use std::time::Duration;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use synapse_types::{AgentId, Cluster, Role};
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::config::{GenerationConfig, SimulationConfig};

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

    fn spawn_engine(config: &SimulationConfig) -> EngineHandle {
        let simulation = Simulation::new(config, SmallRng::seed_from_u64(42)).unwrap();
        EngineHandle::spawn(simulation, config.engine.clone()).unwrap()
    }

    fn agent_a() -> Agent {
        Agent {
            id: AgentId::new("agent-a"),
            name: "Agent A".to_owned(),
            role: Role::Participant,
            age: 14,
            stats: [(Cluster::Science, 2.0)].into_iter().collect(),
            events_attended: 0,
            skills: BTreeSet::new(),
        }
    }

    /// Paused time advances to timer deadlines at millisecond granularity.
    fn assert_elapsed(since: Instant, expected_ms: u64) {
        let elapsed = since.elapsed();
        let expected = Duration::from_millis(expected_ms);
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(5),
            "expected ~{expected_ms} ms, got {elapsed:?}"
        );
    }

    async fn next_update(rx: &mut broadcast::Receiver<OutboundMessage>) -> UpdatePayload {
        match rx.recv().await.unwrap() {
            OutboundMessage::Update(update) => update,
            OutboundMessage::Fault(fault) => panic!("unexpected fault: {}", fault.message),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn initialize_ticks_once_then_step_ticks_again() {
        let engine = spawn_engine(&one_event_config());
        let mut rx = engine.subscribe();

        engine
            .initialize(
                vec![agent_a()],
                vec![ClusterMetric::new(Cluster::Science, 50.0, 1.0)],
                Vec::new(),
            )
            .unwrap();
        let first = next_update(&mut rx).await;
        assert_eq!(first.history.len(), 1);
        let event = first.history.first().unwrap();
        assert_eq!(event.agent_id, AgentId::new("agent-a"));
        assert_eq!(event.agent_name, "Agent A");

        engine.step().unwrap();
        let second = next_update(&mut rx).await;
        assert_eq!(second.history.len(), 2);
        assert_eq!(second.tick, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn step_before_initialize_publishes_an_empty_update() {
        let engine = spawn_engine(&SimulationConfig::default());
        let mut rx = engine.subscribe();
        engine.step().unwrap();
        let update = next_update(&mut rx).await;
        assert!(update.history.is_empty());
        assert!(update.agents.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn play_fires_one_full_period_later() {
        let engine = spawn_engine(&SimulationConfig::default());
        let mut rx = engine.subscribe();
        let started = Instant::now();
        engine.play().unwrap();
        engine.play().unwrap();

        next_update(&mut rx).await;
        assert_elapsed(started, 1000);
        next_update(&mut rx).await;
        assert_elapsed(started, 2000);
    }

    #[tokio::test(start_paused = true)]
    async fn set_speed_while_running_never_double_fires() {
        let engine = spawn_engine(&SimulationConfig::default());
        let mut rx = engine.subscribe();
        let started = Instant::now();
        engine.play().unwrap();

        tokio::time::sleep(Duration::from_millis(600)).await;
        engine.set_speed(2.0).unwrap();

        // The old 1000 ms tick is gone; the new 500 ms period starts at 600.
        next_update(&mut rx).await;
        assert_elapsed(started, 1100);
        next_update(&mut rx).await;
        assert_elapsed(started, 1600);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn speed_set_while_stopped_applies_on_start() {
        let engine = spawn_engine(&SimulationConfig::default());
        let mut rx = engine.subscribe();
        engine.set_speed(4.0).unwrap();
        let started = Instant::now();
        engine.play().unwrap();
        next_update(&mut rx).await;
        assert_elapsed(started, 250);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_periodic_ticks() {
        let engine = spawn_engine(&SimulationConfig::default());
        let mut rx = engine.subscribe();
        engine.play().unwrap();
        next_update(&mut rx).await;
        engine.pause().unwrap();
        engine.pause().unwrap();

        let waited = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
        assert!(waited.is_err(), "no tick may fire while paused");
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_speed_is_rejected_before_sending() {
        let engine = spawn_engine(&SimulationConfig::default());
        let err = engine.set_speed(0.0).unwrap_err();
        assert!(matches!(
            err,
            ControlError::Protocol {
                source: ProtocolError::InvalidSpeed(_)
            }
        ));
        assert!(engine.set_speed(f64::NAN).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn bad_scheduler_settings_are_rejected_before_spawning() {
        let mut config = SimulationConfig::default();
        config.engine.speed_multiplier = f64::NAN;
        let simulation = Simulation::new(&config, SmallRng::seed_from_u64(1)).unwrap();
        let result = EngineHandle::spawn(simulation, config.engine.clone());
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));

        config.engine.speed_multiplier = 1.0;
        config.engine.base_tick_interval_ms = 0;
        let simulation = Simulation::new(&config, SmallRng::seed_from_u64(1)).unwrap();
        assert!(EngineHandle::spawn(simulation, config.engine).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn full_command_queue_rejects_instead_of_buffering() {
        let engine = spawn_engine(&SimulationConfig::default());
        let mut rx = engine.subscribe();

        // The engine task has not been polled yet, so nothing drains.
        for _ in 0..COMMAND_QUEUE_CAPACITY {
            engine.step().unwrap();
        }
        assert!(matches!(engine.step(), Err(ControlError::Busy)));
        assert!(!engine.is_closed());

        for expected in 1..=COMMAND_QUEUE_CAPACITY {
            let update = next_update(&mut rx).await;
            assert_eq!(update.tick, u64::try_from(expected).unwrap());
        }
        engine.step().unwrap();
        assert_eq!(next_update(&mut rx).await.tick, 65);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_failure_publishes_fault_and_disarms_timer() {
        let mut config = SimulationConfig::default();
        config.generation.explore_probability = 3.0;
        let engine = spawn_engine(&config);
        let mut rx = engine.subscribe();
        engine.play().unwrap();

        match rx.recv().await.unwrap() {
            OutboundMessage::Fault(fault) => {
                assert_eq!(fault.tick, 0);
                assert!(fault.message.contains("explore_probability"));
            }
            OutboundMessage::Update(_) => panic!("expected a fault"),
        }
        let waited = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
        assert!(waited.is_err(), "timer must be disarmed after a fault");
    }

    #[tokio::test(start_paused = true)]
    async fn auto_start_arms_after_initialize() {
        let mut config = SimulationConfig::default();
        config.engine.auto_start = true;
        let engine = spawn_engine(&config);
        let mut rx = engine.subscribe();
        let started = Instant::now();
        engine
            .initialize(synapse_catalog::seed_roster(), Vec::new(), Vec::new())
            .unwrap();

        let init_tick = next_update(&mut rx).await;
        assert_eq!(init_tick.tick, 1);
        assert_elapsed(started, 0);
        let periodic = next_update(&mut rx).await;
        assert_eq!(periodic.tick, 2);
        assert_elapsed(started, 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn on_update_sees_every_update() {
        let engine = spawn_engine(&one_event_config());
        let (tx, mut lengths) = mpsc::unbounded_channel();
        let _callback = engine.on_update(move |update| {
            let _ = tx.send(update.history.len());
        });

        engine
            .initialize(vec![agent_a()], Vec::new(), Vec::new())
            .unwrap();
        engine.step().unwrap();

        assert_eq!(lengths.recv().await, Some(1));
        assert_eq!(lengths.recv().await, Some(2));
    }
}
