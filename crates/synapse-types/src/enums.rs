//! Enumeration types for the Synapse engine.
//!
//! [`Cluster`] is the closed catalog of topical domains. Its declaration
//! order is the canonical "catalog order" used for tie-breaking and for
//! every fixed-order scan in the engine.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Clusters
// ---------------------------------------------------------------------------

/// A topical domain agents interact with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Cluster {
    /// Natural sciences: labs, experiments, observation.
    Science,
    /// Computing, robotics, digital tooling.
    Technology,
    /// Building and making things.
    Engineering,
    /// Visual and performing arts.
    Art,
    /// Ecology, outdoors, living systems.
    Nature,
    /// History, civics, communities.
    Society,
}

impl Cluster {
    /// Every cluster, in catalog order.
    pub const ALL: [Self; 6] = [
        Self::Science,
        Self::Technology,
        Self::Engineering,
        Self::Art,
        Self::Nature,
        Self::Society,
    ];

    /// Display name used in narratives and connection keys.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Science => "Science",
            Self::Technology => "Technology",
            Self::Engineering => "Engineering",
            Self::Art => "Art",
            Self::Nature => "Nature",
            Self::Society => "Society",
        }
    }

    /// Position of this cluster in catalog order.
    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|c| *c == self)
            .unwrap_or_default()
    }
}

impl core::fmt::Display for Cluster {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string does not name a known cluster.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown cluster: {0}")]
pub struct UnknownCluster(pub String);

impl core::str::FromStr for Cluster {
    type Err = UnknownCluster;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCluster(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Agent roles
// ---------------------------------------------------------------------------

/// The role an agent plays at the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Role {
    /// Regular visitor.
    Participant,
    /// Domain expert hosting or assisting at a zone.
    Expert,
    /// Event staff.
    Admin,
}

// ---------------------------------------------------------------------------
// Event attributes
// ---------------------------------------------------------------------------

/// Confidence attached to a synthesized interaction signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EvidenceLevel {
    /// Weak or noisy signal. Counted as an anomaly on the cluster.
    Low,
    /// Ordinary signal.
    Medium,
    /// Strong, corroborated signal.
    High,
}

/// What the agent did during the interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Action {
    /// Looked at an exhibit or listened to a talk.
    Observe,
    /// Hands-on interaction.
    Interact,
    /// Asked a question to staff or an expert.
    Question,
    /// Worked through an activity with others.
    Collaborate,
    /// Finished an activity or challenge.
    Complete,
    /// Shared the experience with other participants.
    Share,
}

impl Action {
    /// Every action, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Observe,
        Self::Interact,
        Self::Question,
        Self::Collaborate,
        Self::Complete,
        Self::Share,
    ];
}

// ---------------------------------------------------------------------------
// Derived outputs
// ---------------------------------------------------------------------------

/// Severity band of a narrative sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Severity {
    /// Low band: informational.
    Info,
    /// Medium band: positive trend.
    Success,
    /// High band: needs attention.
    Alert,
}

/// Which narrative detector produced a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum NarrativeKind {
    /// Cluster growth trend.
    Pulse,
    /// Zone concentration of experts or activity.
    Hub,
    /// Age band missing a cluster entirely.
    Deficit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_names_roundtrip_through_from_str() {
        for cluster in Cluster::ALL {
            let parsed: Result<Cluster, _> = cluster.name().parse();
            assert_eq!(parsed, Ok(cluster));
        }
    }

    #[test]
    fn cluster_parse_is_case_insensitive() {
        assert_eq!("technology".parse::<Cluster>(), Ok(Cluster::Technology));
        assert!("Cooking".parse::<Cluster>().is_err());
    }

    #[test]
    fn cluster_index_follows_catalog_order() {
        for (i, cluster) in Cluster::ALL.iter().enumerate() {
            assert_eq!(cluster.index(), i);
        }
    }

    #[test]
    fn cluster_serializes_as_name() {
        let json = serde_json::to_string(&Cluster::Art).ok();
        assert_eq!(json.as_deref(), Some("\"Art\""));
    }

    #[test]
    fn severity_serializes_snake_case() {
        let json = serde_json::to_string(&Severity::Alert).ok();
        assert_eq!(json.as_deref(), Some("\"alert\""));
    }
}
