//! Per-cluster vocabularies and seed metric constants.
//!
//! Every cluster has a non-empty list of zones, topics and event types.
//! The generator samples each list uniformly.

use synapse_types::{Cluster, ClusterMetric};

/// Labels the generator can draw for one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterVocabulary {
    /// Venue or context labels.
    pub zones: &'static [&'static str],
    /// Topic labels.
    pub topics: &'static [&'static str],
    /// Event-type labels.
    pub event_types: &'static [&'static str],
}

const SCIENCE: ClusterVocabulary = ClusterVocabulary {
    zones: &["Wet Lab", "Observatory Dome", "Discovery Hall"],
    topics: &["Chemical Reactions", "Optics", "Microbiology", "Astronomy"],
    event_types: &["Experiment", "Demonstration", "Lecture"],
};

const TECHNOLOGY: ClusterVocabulary = ClusterVocabulary {
    zones: &["Code Studio", "Robotics Arena", "VR Pod"],
    topics: &["Programming", "Robotics", "Artificial Intelligence", "Networks"],
    event_types: &["Workshop", "Hackathon", "Showcase"],
};

const ENGINEERING: ClusterVocabulary = ClusterVocabulary {
    zones: &["Maker Space", "Bridge Yard", "Wind Tunnel"],
    topics: &["Structures", "Electronics", "Mechanics", "Energy Systems"],
    event_types: &["Build Challenge", "Workshop", "Competition"],
};

const ART: ClusterVocabulary = ClusterVocabulary {
    zones: &["Gallery West", "Sound Stage", "Print Studio"],
    topics: &["Painting", "Music Production", "Sculpture", "Digital Art"],
    event_types: &["Studio Session", "Performance", "Exhibition"],
};

const NATURE: ClusterVocabulary = ClusterVocabulary {
    zones: &["Greenhouse", "River Walk", "Insect Lab"],
    topics: &["Botany", "Ecology", "Climate", "Animal Behavior"],
    event_types: &["Field Trip", "Observation", "Talk"],
};

const SOCIETY: ClusterVocabulary = ClusterVocabulary {
    zones: &["Forum", "History Corner", "Debate Room"],
    topics: &["Civics", "Economics", "Local History", "Ethics"],
    event_types: &["Debate", "Role Play", "Panel"],
};

/// Vocabulary for a cluster.
pub const fn vocabulary(cluster: Cluster) -> &'static ClusterVocabulary {
    match cluster {
        Cluster::Science => &SCIENCE,
        Cluster::Technology => &TECHNOLOGY,
        Cluster::Engineering => &ENGINEERING,
        Cluster::Art => &ART,
        Cluster::Nature => &NATURE,
        Cluster::Society => &SOCIETY,
    }
}

/// Seed coverage percentage and ROI for a cluster.
pub const fn seed_constants(cluster: Cluster) -> (f64, f64) {
    match cluster {
        Cluster::Science => (72.0, 1.8),
        Cluster::Technology => (81.0, 2.3),
        Cluster::Engineering => (64.0, 1.5),
        Cluster::Art => (58.0, 1.2),
        Cluster::Nature => (49.0, 1.1),
        Cluster::Society => (43.0, 0.9),
    }
}

/// A fresh metric row for a cluster, seeded with its catalog constants.
pub const fn seed_metric(cluster: Cluster) -> ClusterMetric {
    let (coverage, roi) = seed_constants(cluster);
    ClusterMetric::new(cluster, coverage, roi)
}

/// One fresh metric row per cluster, in catalog order.
pub fn seed_metrics() -> Vec<ClusterMetric> {
    Cluster::ALL.into_iter().map(seed_metric).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_cluster_has_non_empty_vocabulary() {
        for cluster in Cluster::ALL {
            let vocab = vocabulary(cluster);
            assert!(!vocab.zones.is_empty(), "{cluster} has no zones");
            assert!(!vocab.topics.is_empty(), "{cluster} has no topics");
            assert!(!vocab.event_types.is_empty(), "{cluster} has no event types");
        }
    }

    #[test]
    fn seed_metrics_match_catalog_one_to_one() {
        let metrics = seed_metrics();
        let names: Vec<Cluster> = metrics.iter().map(|m| m.name).collect();
        assert_eq!(names, Cluster::ALL.to_vec());
        assert!(metrics.iter().all(|m| m.active_units == 0 && m.anomalies == 0));
    }

    #[test]
    fn zones_are_unique_across_clusters() {
        let mut seen = std::collections::BTreeSet::new();
        for cluster in Cluster::ALL {
            for zone in vocabulary(cluster).zones {
                assert!(seen.insert(*zone), "zone {zone} reused");
            }
        }
    }
}
