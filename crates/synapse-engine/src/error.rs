//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and shutdown so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: synapse_core::config::ConfigError,
    },

    /// The engine task rejected or never received a command.
    #[error("control error: {source}")]
    Control {
        /// The underlying control error.
        #[from]
        source: synapse_core::control::ControlError,
    },

    /// Observer API server failed to start or crashed.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: synapse_observer::ServerError,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
