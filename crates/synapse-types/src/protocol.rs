//! Wire protocol between the engine and its consumers.
//!
//! Commands flow in as [`InboundMessage`], snapshots flow out as
//! [`OutboundMessage`]. Both are adjacently tagged JSON:
//!
//! ```json
//! { "type": "SET_SPEED", "payload": { "multiplier": 2.0 } }
//! { "type": "START" }
//! ```
//!
//! Inbound payloads are validated after decoding with
//! [`InboundMessage::validate`]; [`InboundMessage::decode`] does both.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Cluster;
use crate::ids::AgentId;
use crate::structs::{Agent, ClusterMetric, EventLog, GraphSnapshot};

/// Errors raised when an inbound message fails decoding or validation.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The text was not a well-formed message.
    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),

    /// `SET_SPEED` multiplier was not a finite positive number.
    #[error("speed multiplier must be finite and > 0, got {0}")]
    InvalidSpeed(f64),

    /// The same agent id appeared twice in an `INIT` roster.
    #[error("duplicate agent id in roster: {0}")]
    DuplicateAgent(AgentId),

    /// The same cluster appeared twice in `INIT` metrics.
    #[error("duplicate metric for cluster {0}")]
    DuplicateMetric(Cluster),

    /// An affinity value was negative or not finite.
    #[error("agent {agent} has invalid affinity for {cluster}")]
    InvalidStat {
        /// The offending agent.
        agent: AgentId,
        /// The offending cluster key.
        cluster: Cluster,
    },
}

/// Payload of `INIT`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InitPayload {
    /// Seed roster.
    pub agents: Vec<Agent>,
    /// Seed cluster metrics. Missing clusters are filled from the catalog.
    #[serde(default)]
    pub metrics: Vec<ClusterMetric>,
    /// Seed history, newest first.
    #[serde(default)]
    pub history: Vec<EventLog>,
}

/// Payload of `SET_SPEED`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SetSpeedPayload {
    /// Playback multiplier; the tick interval is the base interval divided by it.
    pub multiplier: f64,
}

/// A command sent to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum InboundMessage {
    /// Load roster, metrics and history, then tick once.
    Init(InitPayload),
    /// Begin periodic ticking.
    Start,
    /// Stop periodic ticking.
    Stop,
    /// Change the playback rate.
    SetSpeed(SetSpeedPayload),
    /// Run exactly one tick.
    Step,
}

impl InboundMessage {
    /// Decode and validate a JSON message.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Decode`] for malformed JSON or an unknown
    /// tag, and the validation errors of [`validate`](Self::validate).
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let msg: Self = serde_json::from_str(text)?;
        msg.validate()?;
        Ok(msg)
    }

    /// Check payload invariants that the type system does not express.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProtocolError`] found.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Self::Init(payload) => validate_init(payload),
            Self::SetSpeed(payload) => {
                if payload.multiplier.is_finite() && payload.multiplier > 0.0 {
                    Ok(())
                } else {
                    Err(ProtocolError::InvalidSpeed(payload.multiplier))
                }
            }
            Self::Start | Self::Stop | Self::Step => Ok(()),
        }
    }

    /// Wire tag of the message, for logging.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Init(_) => "INIT",
            Self::Start => "START",
            Self::Stop => "STOP",
            Self::SetSpeed(_) => "SET_SPEED",
            Self::Step => "STEP",
        }
    }
}

fn validate_init(payload: &InitPayload) -> Result<(), ProtocolError> {
    let mut seen_agents = BTreeSet::new();
    for agent in &payload.agents {
        if !seen_agents.insert(&agent.id) {
            return Err(ProtocolError::DuplicateAgent(agent.id.clone()));
        }
        for (cluster, value) in &agent.stats {
            if !value.is_finite() || *value < 0.0 {
                return Err(ProtocolError::InvalidStat {
                    agent: agent.id.clone(),
                    cluster: *cluster,
                });
            }
        }
    }

    let mut seen_metrics = BTreeSet::new();
    for metric in &payload.metrics {
        if !seen_metrics.insert(metric.name) {
            return Err(ProtocolError::DuplicateMetric(metric.name));
        }
    }
    Ok(())
}

/// Full engine state published after every tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UpdatePayload {
    /// Number of ticks executed so far.
    pub tick: u64,
    /// Event history, newest first.
    pub history: Vec<EventLog>,
    /// Current roster.
    pub agents: Vec<Agent>,
    /// Current cluster metrics, in catalog order.
    pub metrics: Vec<ClusterMetric>,
    /// Graph tracker output.
    pub graph: GraphSnapshot,
}

/// Payload of `FAULT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FaultPayload {
    /// Tick number at which the failure happened.
    pub tick: u64,
    /// Error description.
    pub message: String,
}

/// A message published by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum OutboundMessage {
    /// Replacement snapshot of the engine state.
    Update(UpdatePayload),
    /// A tick failed and periodic ticking was suspended.
    Fault(FaultPayload),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;
    use crate::enums::Role;

    fn agent(id: &str) -> Agent {
        Agent {
            id: AgentId::new(id),
            name: id.to_uppercase(),
            role: Role::Participant,
            age: 14,
            stats: BTreeMap::from([(Cluster::Science, 2.0)]),
            events_attended: 0,
            skills: BTreeSet::new(),
        }
    }

    #[test]
    fn decodes_unit_commands() {
        let msg = InboundMessage::decode(r#"{"type":"START"}"#).unwrap();
        assert_eq!(msg, InboundMessage::Start);
        let msg = InboundMessage::decode(r#"{"type":"STEP"}"#).unwrap();
        assert_eq!(msg.tag(), "STEP");
    }

    #[test]
    fn decodes_set_speed() {
        let msg =
            InboundMessage::decode(r#"{"type":"SET_SPEED","payload":{"multiplier":2.5}}"#).unwrap();
        assert_eq!(
            msg,
            InboundMessage::SetSpeed(SetSpeedPayload { multiplier: 2.5 })
        );
    }

    #[test]
    fn rejects_non_positive_speed() {
        let err = InboundMessage::decode(r#"{"type":"SET_SPEED","payload":{"multiplier":0}}"#)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidSpeed(_)));

        let msg = InboundMessage::SetSpeed(SetSpeedPayload {
            multiplier: f64::NAN,
        });
        assert!(msg.validate().is_err());
    }

    #[test]
    fn rejects_unknown_tag() {
        let err = InboundMessage::decode(r#"{"type":"REWIND"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn rejects_duplicate_agents() {
        let msg = InboundMessage::Init(InitPayload {
            agents: vec![agent("a"), agent("a")],
            ..InitPayload::default()
        });
        assert!(matches!(
            msg.validate(),
            Err(ProtocolError::DuplicateAgent(_))
        ));
    }

    #[test]
    fn rejects_negative_affinity() {
        let mut bad = agent("b");
        bad.stats.insert(Cluster::Art, -1.0);
        let msg = InboundMessage::Init(InitPayload {
            agents: vec![bad],
            ..InitPayload::default()
        });
        assert!(matches!(
            msg.validate(),
            Err(ProtocolError::InvalidStat {
                cluster: Cluster::Art,
                ..
            })
        ));
    }

    #[test]
    fn rejects_duplicate_metrics() {
        let msg = InboundMessage::Init(InitPayload {
            agents: Vec::new(),
            metrics: vec![
                ClusterMetric::new(Cluster::Art, 40.0, 1.2),
                ClusterMetric::new(Cluster::Art, 40.0, 1.2),
            ],
            history: Vec::new(),
        });
        assert!(matches!(
            msg.validate(),
            Err(ProtocolError::DuplicateMetric(Cluster::Art))
        ));
    }

    #[test]
    fn init_without_history_uses_default() {
        let json = r#"{"type":"INIT","payload":{"agents":[]}}"#;
        let msg = InboundMessage::decode(json).unwrap();
        assert_eq!(msg, InboundMessage::Init(InitPayload::default()));
    }

    #[test]
    fn update_encodes_with_type_tag() {
        let msg = OutboundMessage::Update(UpdatePayload::default());
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "UPDATE");
        assert!(value["payload"]["graph"]["edges"].is_array());
    }
}
