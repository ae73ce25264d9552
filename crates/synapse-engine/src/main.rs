//! Engine binary for Synapse.
//!
//! Wires configuration, structured logging, the engine task and the
//! Observer API together, then runs until the observer server exits or
//! `Ctrl-C` is received.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `synapse-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the simulation and spawn the engine task
//! 4. Attach the observer bridge
//! 5. Initialize the engine with the seed roster and metrics
//! 6. Serve the Observer API, or wait for `Ctrl-C` when it is disabled

mod bridge;
mod error;

use std::path::Path;
use std::sync::Arc;

use synapse_core::config::{LoggingConfig, SimulationConfig};
use synapse_core::control::EngineHandle;
use synapse_core::tick::Simulation;
use synapse_observer::{AppState, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Configuration file looked up in the working directory.
const CONFIG_PATH: &str = "synapse-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the engine rejects the
/// seed data, or the observer server fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        seed = ?config.engine.seed,
        base_tick_interval_ms = config.engine.base_tick_interval_ms,
        speed_multiplier = config.engine.speed_multiplier,
        auto_start = config.engine.auto_start,
        history_cap = config.engine.history_cap,
        "synapse-engine starting"
    );

    // 3. Spawn the engine task.
    let simulation = Simulation::from_config(&config).map_err(EngineError::from)?;
    let engine =
        EngineHandle::spawn(simulation, config.engine.clone()).map_err(EngineError::from)?;
    info!("Engine task spawned");

    // 4. Attach the observer bridge before the first update is published.
    let app_state = Arc::new(AppState::with_engine(engine.clone()));
    let _bridge = bridge::spawn(engine.subscribe(), Arc::clone(&app_state));

    // 5. Seed the engine.
    let roster = synapse_catalog::seed_roster();
    info!(agents = roster.len(), "Seeding engine");
    engine
        .initialize(roster, synapse_catalog::seed_metrics(), Vec::new())
        .map_err(EngineError::from)?;

    // 6. Serve until shutdown.
    run(&config, app_state).await?;

    info!("synapse-engine shutdown complete");
    Ok(())
}

async fn run(config: &SimulationConfig, state: Arc<AppState>) -> Result<(), EngineError> {
    if config.observer.enabled {
        let server = ServerConfig::from(&config.observer);
        tokio::select! {
            result = synapse_observer::start_server(&server, state) => result?,
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Shutdown signal received");
            }
        }
    } else {
        info!("Observer API disabled, running headless");
        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received");
    }
    Ok(())
}

/// Load `synapse-config.yaml`, falling back to defaults (plus environment
/// overrides) when the file does not exist.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        Ok(SimulationConfig::from_file(path)?)
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
