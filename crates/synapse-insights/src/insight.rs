//! Behavioral archetype tags for a single agent.
//!
//! [`insights`] is a pure function. It reduces the agent's own events to a
//! handful of [`InsightFeatures`], then walks the ordered [`RULES`] table
//! and keeps the tag of every rule that fires, up to [`MAX_TAGS`].
//!
//! # Rules
//!
//! | # | Tag | Fires when |
//! |---|-----|------------|
//! | 1 | Specialist | >= 5 events and >= 70% in one cluster |
//! | 2 | Polymath | events in every cluster |
//! | 3 | Explorer | events in 4 or 5 clusters |
//! | 4 | Deep Diver | mean load >= 7 in the dominant cluster |
//! | 5 | Deep Thinker | >= 50% of events with load >= 7 |
//! | 6 | Light Touch | >= 50% of events with load <= 3 |
//! | 7 | Quick Responder | >= 50% of events under 600 ms |
//! | 8 | Deliberator | >= 50% of events over 2000 ms |
//! | 9 | Skeptic | >= 40% low-evidence events |
//! | 10 | Evidence Builder | >= 3 events and >= 60% high-evidence |
//! | 11 | Trend Follower | >= 3 events and >= 60% in the popular cluster |
//! | 12 | Trailblazer | >= 3 events and <= 20% in the popular cluster |
//! | 13 | High-Impact Focus | dominant cluster ROI >= 2.0 |
//! | 14 | Frontier Seeker | dominant cluster coverage < 50% |
//! | 15 | Regular | >= 10 events |

use std::collections::BTreeMap;

use synapse_types::{Agent, Cluster, ClusterMetric, EventLog, EvidenceLevel, InsightTag};

/// At most this many tags are returned.
pub const MAX_TAGS: usize = 4;

const HIGH_LOAD: f64 = 7.0;
const LOW_LOAD: f64 = 3.0;
const FAST_LATENCY_MS: u32 = 600;
const SLOW_LATENCY_MS: u32 = 2000;

/// Aggregates over one agent's events.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightFeatures {
    /// Number of events by the agent.
    pub total: usize,
    /// Events per cluster.
    pub per_cluster: BTreeMap<Cluster, usize>,
    /// Summed cognitive load per cluster.
    pub load_per_cluster: BTreeMap<Cluster, f64>,
    /// Most visited cluster (ties resolve in catalog order).
    pub dominant: Cluster,
    /// Share of events in the dominant cluster.
    pub dominant_share: f64,
    /// Mean cognitive load in the dominant cluster.
    pub dominant_mean_load: f64,
    /// Number of clusters with at least one event.
    pub distinct_clusters: usize,
    /// Share of low-evidence events.
    pub low_evidence_share: f64,
    /// Share of high-evidence events.
    pub high_evidence_share: f64,
    /// Share of events with load at or above 7.
    pub high_load_share: f64,
    /// Share of events with load at or below 3.
    pub low_load_share: f64,
    /// Share of events answered in under 600 ms.
    pub fast_share: f64,
    /// Share of events that took over 2000 ms.
    pub slow_share: f64,
    /// Share of the agent's events whose cluster was the most popular one
    /// among all earlier events at the moment of choice. Events with no
    /// earlier history are not judged; `None` when none can be.
    pub trend_agreement: Option<f64>,
    /// Metric row of the dominant cluster, when present.
    pub dominant_metric: Option<ClusterMetric>,
}

/// One row of the rule table.
#[derive(Debug, Clone, Copy)]
pub struct InsightRule {
    /// Tag label.
    pub label: &'static str,
    /// Tag description.
    pub description: &'static str,
    /// Tag color.
    pub color: &'static str,
    /// Whether the rule fires.
    pub applies: fn(&InsightFeatures) -> bool,
}

impl InsightRule {
    fn tag(&self) -> InsightTag {
        InsightTag {
            label: self.label.to_owned(),
            description: self.description.to_owned(),
            color: self.color.to_owned(),
        }
    }
}

/// The rule battery, in evaluation order.
pub static RULES: &[InsightRule] = &[
    InsightRule {
        label: "Specialist",
        description: "Keeps coming back to one cluster.",
        color: "#6366f1",
        applies: |f| f.total >= 5 && f.dominant_share >= 0.7,
    },
    InsightRule {
        label: "Polymath",
        description: "Has engaged with every cluster.",
        color: "#a855f7",
        applies: |f| f.distinct_clusters == Cluster::ALL.len(),
    },
    InsightRule {
        label: "Explorer",
        description: "Moves across many clusters.",
        color: "#22c55e",
        applies: |f| (4..Cluster::ALL.len()).contains(&f.distinct_clusters),
    },
    InsightRule {
        label: "Deep Diver",
        description: "Takes on demanding content in their main cluster.",
        color: "#0ea5e9",
        applies: |f| f.dominant_mean_load >= HIGH_LOAD,
    },
    InsightRule {
        label: "Deep Thinker",
        description: "Most interactions carry a high cognitive load.",
        color: "#3b82f6",
        applies: |f| f.high_load_share >= 0.5,
    },
    InsightRule {
        label: "Light Touch",
        description: "Prefers low-effort interactions.",
        color: "#facc15",
        applies: |f| f.low_load_share >= 0.5,
    },
    InsightRule {
        label: "Quick Responder",
        description: "Usually reacts within a fraction of a second.",
        color: "#f97316",
        applies: |f| f.fast_share >= 0.5,
    },
    InsightRule {
        label: "Deliberator",
        description: "Takes time before responding.",
        color: "#64748b",
        applies: |f| f.slow_share >= 0.5,
    },
    InsightRule {
        label: "Skeptic",
        description: "Many interactions end without solid evidence.",
        color: "#ef4444",
        applies: |f| f.low_evidence_share >= 0.4,
    },
    InsightRule {
        label: "Evidence Builder",
        description: "Consistently produces strong evidence of learning.",
        color: "#10b981",
        applies: |f| f.total >= 3 && f.high_evidence_share >= 0.6,
    },
    InsightRule {
        label: "Trend Follower",
        description: "Gravitates to whatever is popular.",
        color: "#ec4899",
        applies: |f| f.total >= 3 && f.trend_agreement.is_some_and(|a| a >= 0.6),
    },
    InsightRule {
        label: "Trailblazer",
        description: "Steers clear of the crowd favorite.",
        color: "#14b8a6",
        applies: |f| f.total >= 3 && f.trend_agreement.is_some_and(|a| a <= 0.2),
    },
    InsightRule {
        label: "High-Impact Focus",
        description: "Main cluster has a strong return on investment.",
        color: "#84cc16",
        applies: |f| f.dominant_metric.as_ref().is_some_and(|m| m.roi >= 2.0),
    },
    InsightRule {
        label: "Frontier Seeker",
        description: "Main cluster is still thinly covered.",
        color: "#eab308",
        applies: |f| f.dominant_metric.as_ref().is_some_and(|m| m.coverage < 50.0),
    },
    InsightRule {
        label: "Regular",
        description: "A frequent visitor.",
        color: "#78716c",
        applies: |f| f.total >= 10,
    },
];

/// Tag returned for an agent with no recorded events.
pub fn newcomer() -> InsightTag {
    InsightTag {
        label: "Newcomer".to_owned(),
        description: "No recorded interactions yet.".to_owned(),
        color: "#94a3b8".to_owned(),
    }
}

/// Archetype tags for `agent`, in rule order, at most [`MAX_TAGS`].
///
/// `history` is the global history, newest first.
pub fn insights(
    agent: &Agent,
    history: &[EventLog],
    metrics: &[ClusterMetric],
) -> Vec<InsightTag> {
    let Some(features) = extract_features(agent, history, metrics) else {
        return vec![newcomer()];
    };
    RULES
        .iter()
        .filter(|rule| (rule.applies)(&features))
        .take(MAX_TAGS)
        .map(InsightRule::tag)
        .collect()
}

/// Reduce the agent's events to [`InsightFeatures`]. `None` when the agent
/// has no events in `history`.
pub fn extract_features(
    agent: &Agent,
    history: &[EventLog],
    metrics: &[ClusterMetric],
) -> Option<InsightFeatures> {
    let own: Vec<&EventLog> = history.iter().filter(|e| e.agent_id == agent.id).collect();
    if own.is_empty() {
        return None;
    }
    let total = own.len();

    let mut per_cluster: BTreeMap<Cluster, usize> = BTreeMap::new();
    let mut load_per_cluster: BTreeMap<Cluster, f64> = BTreeMap::new();
    for event in &own {
        let count = per_cluster.entry(event.cluster).or_insert(0);
        *count = count.saturating_add(1);
        *load_per_cluster.entry(event.cluster).or_insert(0.0) += event.cognitive_load;
    }

    let dominant = arg_max(&per_cluster)?;
    let dominant_count = per_cluster.get(&dominant).copied().unwrap_or(0);
    let dominant_load = load_per_cluster.get(&dominant).copied().unwrap_or(0.0);

    let share = |pred: &dyn Fn(&EventLog) -> bool| {
        ratio(own.iter().filter(|e| pred(e)).count(), total)
    };

    Some(InsightFeatures {
        total,
        dominant,
        dominant_share: ratio(dominant_count, total),
        dominant_mean_load: dominant_load / as_f64(dominant_count.max(1)),
        distinct_clusters: per_cluster.len(),
        low_evidence_share: share(&|e: &EventLog| e.evidence == EvidenceLevel::Low),
        high_evidence_share: share(&|e: &EventLog| e.evidence == EvidenceLevel::High),
        high_load_share: share(&|e: &EventLog| e.cognitive_load >= HIGH_LOAD),
        low_load_share: share(&|e: &EventLog| e.cognitive_load <= LOW_LOAD),
        fast_share: share(&|e: &EventLog| e.latency_ms < FAST_LATENCY_MS),
        slow_share: share(&|e: &EventLog| e.latency_ms > SLOW_LATENCY_MS),
        trend_agreement: trend_agreement(agent, history),
        dominant_metric: metrics.iter().find(|m| m.name == dominant).cloned(),
        per_cluster,
        load_per_cluster,
    })
}

/// Replay `history` oldest first and compare each of the agent's choices
/// with the most frequent cluster among the events before it.
fn trend_agreement(agent: &Agent, history: &[EventLog]) -> Option<f64> {
    let mut counts: BTreeMap<Cluster, usize> = BTreeMap::new();
    let (mut judged, mut agreed) = (0_usize, 0_usize);
    for event in history.iter().rev() {
        match arg_max(&counts) {
            Some(popular) if event.agent_id == agent.id => {
                judged = judged.saturating_add(1);
                if popular == event.cluster {
                    agreed = agreed.saturating_add(1);
                }
            }
            _ => {}
        }
        let count = counts.entry(event.cluster).or_insert(0);
        *count = count.saturating_add(1);
    }
    (judged > 0).then(|| ratio(agreed, judged))
}

/// Most frequent cluster (ties in catalog order).

fn arg_max(counts: &BTreeMap<Cluster, usize>) -> Option<Cluster> {
    let mut best: Option<(Cluster, usize)> = None;
    for cluster in Cluster::ALL {
        let Some(count) = counts.get(&cluster).copied() else {
            continue;
        };
        match best {
            Some((_, top)) if count <= top => {}
            _ => best = Some((cluster, count)),
        }
    }
    best.map(|(cluster, _)| cluster)
}

fn as_f64(n: usize) -> f64 {
    // Event counts are bounded by the history cap.
    #[allow(clippy::cast_precision_loss)]
    let value = n as f64;
    value
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    as_f64(part) / as_f64(whole)
}
