//! Default roster of simulated agents.
//!
//! 24 agents spread over the children, teens and youth age bands plus a
//! handful of adult experts and staff. Each agent starts with a primary and
//! a secondary cluster affinity; every other cluster starts at zero.

use std::collections::{BTreeMap, BTreeSet};

use synapse_types::{Agent, AgentId, Cluster, Role};

use Cluster::{Art, Engineering, Nature, Science, Society, Technology};
use Role::{Admin, Expert, Participant};

/// Starting affinity for an agent's primary cluster.
pub const PRIMARY_AFFINITY: f64 = 5.0;

/// Starting affinity for an agent's secondary cluster.
pub const SECONDARY_AFFINITY: f64 = 2.0;

/// Static description of one roster entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterEntry {
    /// Roster identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Role at the event.
    pub role: Role,
    /// Age in years.
    pub age: u32,
    /// Strongest starting interest.
    pub primary: Cluster,
    /// Second starting interest.
    pub secondary: Cluster,
}

/// Helper to build a [`RosterEntry`].
const fn entry(
    id: &'static str,
    name: &'static str,
    role: Role,
    age: u32,
    primary: Cluster,
    secondary: Cluster,
) -> RosterEntry {
    RosterEntry {
        id,
        name,
        role,
        age,
        primary,
        secondary,
    }
}

/// The default roster, in display order.
pub const ROSTER: [RosterEntry; 24] = [
    // --- Children (6-12) ---
    entry("u01", "Mila", Participant, 8, Nature, Art),
    entry("u02", "Theo", Participant, 10, Technology, Engineering),
    entry("u03", "Ines", Participant, 7, Art, Nature),
    entry("u04", "Noah", Participant, 11, Science, Technology),
    entry("u05", "Lea", Participant, 9, Engineering, Science),
    entry("u06", "Jonas", Participant, 12, Technology, Science),
    // --- Teens (13-17) ---
    entry("u07", "Sofia", Participant, 14, Science, Nature),
    entry("u08", "Luca", Participant, 16, Technology, Art),
    entry("u09", "Emma", Participant, 15, Art, Society),
    entry("u10", "Felix", Participant, 13, Engineering, Technology),
    entry("u11", "Hana", Participant, 17, Society, Science),
    entry("u12", "Omar", Participant, 15, Technology, Engineering),
    entry("u13", "Clara", Participant, 16, Nature, Science),
    entry("u14", "Yusuf", Participant, 14, Science, Engineering),
    // --- Youth (18-25) ---
    entry("u15", "Aylin", Participant, 19, Society, Art),
    entry("u16", "Ben", Participant, 22, Technology, Society),
    entry("u17", "Nora", Expert, 24, Science, Technology),
    entry("u18", "Kai", Participant, 20, Art, Technology),
    entry("u19", "Lina", Expert, 25, Engineering, Nature),
    entry("u20", "Malik", Participant, 18, Nature, Society),
    // --- Adults ---
    entry("u21", "Dr. Petra Vogel", Expert, 41, Science, Nature),
    entry("u22", "Samir Haddad", Expert, 36, Technology, Engineering),
    entry("u23", "Grace Okafor", Expert, 52, Art, Society),
    entry("u24", "Tom Berger", Admin, 45, Society, Technology),
];

impl RosterEntry {
    /// Materialize the entry as an [`Agent`] with normalized stats.
    pub fn to_agent(&self) -> Agent {
        let mut stats: BTreeMap<Cluster, f64> =
            Cluster::ALL.into_iter().map(|c| (c, 0.0)).collect();
        stats.insert(self.secondary, SECONDARY_AFFINITY);
        stats.insert(self.primary, PRIMARY_AFFINITY);
        Agent {
            id: AgentId::new(self.id),
            name: self.name.to_owned(),
            role: self.role,
            age: self.age,
            stats,
            events_attended: 0,
            skills: BTreeSet::new(),
        }
    }
}

/// The default roster as agents, in display order.
pub fn seed_roster() -> Vec<Agent> {
    ROSTER.iter().map(RosterEntry::to_agent).collect()
}
