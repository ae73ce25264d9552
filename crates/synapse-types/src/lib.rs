//! Shared type definitions for the Synapse engine.
//!
//! This crate is the single source of truth for all types that cross crate
//! or process boundaries. Types flow downstream to `TypeScript` via `ts-rs`
//! for the dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier wrappers for events and agents
//! - [`enums`] -- Clusters, roles, evidence levels, actions, severities
//! - [`structs`] -- Store tables and derived outputs
//! - [`protocol`] -- Inbound commands and outbound snapshots

pub mod enums;
pub mod ids;
pub mod protocol;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Action, Cluster, EvidenceLevel, NarrativeKind, Role, Severity, UnknownCluster};
pub use ids::{AgentId, EventId};
pub use protocol::{
    FaultPayload, InboundMessage, InitPayload, OutboundMessage, ProtocolError, SetSpeedPayload,
    UpdatePayload,
};
pub use structs::{
    Agent, ClusterMetric, ConnectionEdge, EventLog, GraphSnapshot, InsightTag, NarrativeInsight,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::EventId::export_all();
        let _ = crate::ids::AgentId::export_all();

        // Enums
        let _ = crate::enums::Cluster::export_all();
        let _ = crate::enums::Role::export_all();
        let _ = crate::enums::EvidenceLevel::export_all();
        let _ = crate::enums::Action::export_all();
        let _ = crate::enums::Severity::export_all();
        let _ = crate::enums::NarrativeKind::export_all();

        // Structs
        let _ = crate::structs::Agent::export_all();
        let _ = crate::structs::EventLog::export_all();
        let _ = crate::structs::ClusterMetric::export_all();
        let _ = crate::structs::ConnectionEdge::export_all();
        let _ = crate::structs::GraphSnapshot::export_all();
        let _ = crate::structs::InsightTag::export_all();
        let _ = crate::structs::NarrativeInsight::export_all();

        // Protocol
        let _ = crate::protocol::InitPayload::export_all();
        let _ = crate::protocol::SetSpeedPayload::export_all();
        let _ = crate::protocol::InboundMessage::export_all();
        let _ = crate::protocol::UpdatePayload::export_all();
        let _ = crate::protocol::FaultPayload::export_all();
        let _ = crate::protocol::OutboundMessage::export_all();
    }
}
