//! Cluster assignment produced for one (planet, tier) pair

use serde::{Deserialize, Serialize};

/// Size-ordered relabeling of a raw cluster index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StableRank {
    /// 1 = smallest mean ranking feature, k' = largest
    pub rank: usize,
    /// Presentation label derived from `rank` and the number of clusters
    pub label: String,
}

impl StableRank {
    /// Build a rank together with its derived label
    pub fn new(rank: usize, total: usize) -> Self {
        Self {
            rank,
            label: rank_label(rank, total),
        }
    }
}

/// Label text for a rank among `total` clusters
///
/// Carries no state of its own: the same `(rank, total)` always yields the
/// same text.
pub fn rank_label(rank: usize, total: usize) -> String {
    if rank == 1 {
        "Cluster #1 (Smallest)".to_string()
    } else if rank == total {
        format!("Cluster #{} (Largest)", total)
    } else {
        format!("Cluster #{}", rank)
    }
}

/// Assignment of one planet within one tier's run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// Planet name (natural key)
    pub planet_name: String,
    /// Index returned by the clustering algorithm. Never shown to consumers.
    pub raw_index: usize,
    /// Stable rank in `[1, k']`
    pub rank: usize,
    /// Label derived from the rank
    pub label: String,
}

/// Persisted form read back by reporting consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAssignment {
    pub planet_name: String,
    pub rank: usize,
    pub label: String,
}
