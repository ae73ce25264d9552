//! Configuration loading and typed config structures for the Synapse engine.
//!
//! The canonical configuration lives in `synapse-config.yaml` at the working
//! directory. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file. Every
//! field has a default, so a partial file (or none at all) is valid.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is outside its allowed range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `synapse-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Scheduler and retention settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Event synthesis parameters.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Connection graph parameters.
    #[serde(default)]
    pub graph: GraphConfig,

    /// Observer API server settings.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `SYNAPSE_SEED` overrides `engine.seed`
    /// - `SYNAPSE_AUTO_START` overrides `engine.auto_start`
    /// - `SYNAPSE_OBSERVER_PORT` overrides `observer.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `SYNAPSE_*` environment overrides. Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(seed) = env_parse::<u64>("SYNAPSE_SEED") {
            self.engine.seed = Some(seed);
        }
        if let Some(auto_start) = env_parse::<bool>("SYNAPSE_AUTO_START") {
            self.engine.auto_start = auto_start;
        }
        if let Some(port) = env_parse::<u16>("SYNAPSE_OBSERVER_PORT") {
            self.observer.port = port;
        }
    }

    /// Check every section for out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.generation.validate()?;
        self.graph.validate()
    }
}

fn env_parse<T: core::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// Scheduler and retention configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Seed for the random source. `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Tick interval at speed multiplier 1.0, in milliseconds.
    #[serde(default = "default_base_tick_interval_ms")]
    pub base_tick_interval_ms: u64,

    /// Initial playback multiplier.
    #[serde(default = "default_speed_multiplier")]
    pub speed_multiplier: f64,

    /// Start periodic ticking right after `INIT`.
    #[serde(default)]
    pub auto_start: bool,

    /// Maximum number of events kept in history.
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
}

impl EngineConfig {
    /// Tick period for a given multiplier, never shorter than one millisecond.
    ///
    /// A multiplier that is not finite and positive yields the base period.
    pub fn tick_interval(&self, multiplier: f64) -> Duration {
        let multiplier = if multiplier.is_finite() && multiplier > 0.0 {
            multiplier
        } else {
            1.0
        };
        #[allow(clippy::cast_precision_loss)]
        let base_us = self.base_tick_interval_ms.saturating_mul(1000) as f64;
        let us = (base_us / multiplier).clamp(1000.0, base_us.max(1000.0) * 1_000_000.0);
        // Clamped into a positive range well below u64::MAX.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let micros = us.round() as u64;
        Duration::from_micros(micros)
    }

    /// Check the scheduler settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_tick_interval_ms == 0 {
            return Err(invalid("engine.base_tick_interval_ms must be at least 1"));
        }
        if !self.speed_multiplier.is_finite() || self.speed_multiplier <= 0.0 {
            return Err(invalid("engine.speed_multiplier must be finite and > 0"));
        }
        if self.history_cap == 0 {
            return Err(invalid("engine.history_cap must be at least 1"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            base_tick_interval_ms: default_base_tick_interval_ms(),
            speed_multiplier: default_speed_multiplier(),
            auto_start: false,
            history_cap: default_history_cap(),
        }
    }
}

/// Event synthesis configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerationConfig {
    /// Probability of replacing the primary cluster with a random one.
    #[serde(default = "default_explore_probability")]
    pub explore_probability: f64,

    /// Fewest events synthesized per tick.
    #[serde(default = "default_min_events_per_tick")]
    pub min_events_per_tick: u32,

    /// Most events synthesized per tick.
    #[serde(default = "default_max_events_per_tick")]
    pub max_events_per_tick: u32,

    /// Lower bound of the simulated latency, in milliseconds.
    #[serde(default = "default_latency_min_ms")]
    pub latency_min_ms: u32,

    /// Upper bound of the simulated latency, in milliseconds.
    #[serde(default = "default_latency_max_ms")]
    pub latency_max_ms: u32,
}

impl GenerationConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.explore_probability) {
            return Err(invalid("generation.explore_probability must be within [0, 1]"));
        }
        if self.min_events_per_tick == 0 {
            return Err(invalid("generation.min_events_per_tick must be at least 1"));
        }
        if self.min_events_per_tick > self.max_events_per_tick {
            return Err(invalid(
                "generation.min_events_per_tick exceeds max_events_per_tick",
            ));
        }
        if self.latency_min_ms > self.latency_max_ms {
            return Err(invalid("generation.latency_min_ms exceeds latency_max_ms"));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            explore_probability: default_explore_probability(),
            min_events_per_tick: default_min_events_per_tick(),
            max_events_per_tick: default_max_events_per_tick(),
            latency_min_ms: default_latency_min_ms(),
            latency_max_ms: default_latency_max_ms(),
        }
    }
}

/// Connection graph configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphConfig {
    /// Multiplicative decay applied to every connection each tick.
    #[serde(default = "default_decay_factor")]
    pub decay_factor: f64,

    /// Connections whose weight falls below this are forgotten.
    #[serde(default = "default_prune_threshold")]
    pub prune_threshold: f64,

    /// Weight that maps to a normalized edge weight of 1.0.
    #[serde(default = "default_weight_scale")]
    pub weight_scale: f64,

    /// Number of influencers reported.
    #[serde(default = "default_influencer_count")]
    pub influencer_count: usize,

    /// An influencer needs non-zero affinity in more than this many clusters.
    #[serde(default = "default_min_active_clusters")]
    pub min_active_clusters: usize,
}

impl GraphConfig {
    /// Check the decay, prune and scale settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.decay_factor > 0.0 && self.decay_factor <= 1.0) {
            return Err(invalid("graph.decay_factor must be within (0, 1]"));
        }
        if !self.prune_threshold.is_finite() || self.prune_threshold < 0.0 {
            return Err(invalid("graph.prune_threshold must be finite and >= 0"));
        }
        if !self.weight_scale.is_finite() || self.weight_scale <= 0.0 {
            return Err(invalid("graph.weight_scale must be finite and > 0"));
        }
        Ok(())
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            decay_factor: default_decay_factor(),
            prune_threshold: default_prune_threshold(),
            weight_scale: default_weight_scale(),
            influencer_count: default_influencer_count(),
            min_active_clusters: default_min_active_clusters(),
        }
    }
}

/// Observer API server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Whether to start the HTTP server at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind address.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_base_tick_interval_ms() -> u64 {
    1000
}

const fn default_speed_multiplier() -> f64 {
    1.0
}

const fn default_history_cap() -> usize {
    500
}

const fn default_explore_probability() -> f64 {
    0.25
}

const fn default_min_events_per_tick() -> u32 {
    1
}

const fn default_max_events_per_tick() -> u32 {
    3
}

const fn default_latency_min_ms() -> u32 {
    120
}

const fn default_latency_max_ms() -> u32 {
    3200
}

const fn default_decay_factor() -> f64 {
    0.99
}

const fn default_prune_threshold() -> f64 {
    0.1
}

const fn default_weight_scale() -> f64 {
    5.0
}

const fn default_influencer_count() -> usize {
    3
}

const fn default_min_active_clusters() -> usize {
    2
}

const fn default_true() -> bool {
    true
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}
