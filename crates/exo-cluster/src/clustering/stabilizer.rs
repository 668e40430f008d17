//! Rank stabilization of raw cluster indices
//!
//! Raw indices from a clustering fit are arbitrary: a different seed or a
//! slightly different population can permute them. Ranking clusters by the
//! mean of an untransformed physical attribute gives every cluster a stable,
//! size-ordered identity that survives such permutations.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::types::StableRank;

/// Per-cluster statistics used for ordering
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCluster {
    /// Raw index from the fitter
    pub raw_index: usize,
    /// Members in this run
    pub size: usize,
    /// Mean of the ranking feature over members
    pub mean: f64,
    /// Assigned rank and label
    pub rank: StableRank,
}

/// Mapping from raw index to stable rank for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RankMapping {
    /// Sorted by rank ascending
    clusters: Vec<RankedCluster>,
    by_raw: BTreeMap<usize, usize>,
}

impl RankMapping {
    /// Rank assigned to a raw index present in this run
    pub fn get(&self, raw_index: usize) -> Option<&StableRank> {
        self.by_raw
            .get(&raw_index)
            .map(|&pos| &self.clusters[pos].rank)
    }

    /// Number of non-empty raw clusters (k')
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Clusters in rank order
    pub fn clusters(&self) -> &[RankedCluster] {
        &self.clusters
    }

    /// Rank per row for a label sequence
    pub fn ranks_for(&self, labels: &[usize]) -> Result<Vec<usize>> {
        labels
            .iter()
            .map(|raw| {
                self.get(*raw).map(|r| r.rank).ok_or_else(|| {
                    Error::invalid_input(format!("raw index {} not present in this run", raw))
                })
            })
            .collect()
    }
}

/// Map raw cluster indices onto size-ordered ranks
///
/// `ranking_values[i]` is the untransformed ranking attribute of row `i`.
/// Groups are sorted by ascending mean, ties broken by raw index, and ranked
/// `1..=k'` over the raw indices that actually occur.
pub fn stabilize(labels: &[usize], ranking_values: &[f64]) -> Result<RankMapping> {
    if labels.len() != ranking_values.len() {
        return Err(Error::invalid_input(format!(
            "{} labels but {} ranking values",
            labels.len(),
            ranking_values.len()
        )));
    }
    if labels.is_empty() {
        return Err(Error::invalid_input("cannot rank an empty assignment"));
    }
    if let Some(bad) = ranking_values.iter().find(|v| !v.is_finite()) {
        return Err(Error::invalid_input(format!("non-finite ranking value {}", bad)));
    }

    // raw index -> (sum, count)
    let mut groups: BTreeMap<usize, (f64, usize)> = BTreeMap::new();
    for (&raw, &value) in labels.iter().zip(ranking_values) {
        let entry = groups.entry(raw).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let mut ordered: Vec<(usize, usize, f64)> = groups
        .into_iter()
        .map(|(raw, (sum, count))| (raw, count, sum / count as f64))
        .collect();

    ordered.sort_by(|a, b| a.2.total_cmp(&b.2).then(a.0.cmp(&b.0)));

    let total = ordered.len();
    let clusters: Vec<RankedCluster> = ordered
        .into_iter()
        .enumerate()
        .map(|(pos, (raw_index, size, mean))| RankedCluster {
            raw_index,
            size,
            mean,
            rank: StableRank::new(pos + 1, total),
        })
        .collect();

    let by_raw = clusters
        .iter()
        .enumerate()
        .map(|(pos, c)| (c.raw_index, pos))
        .collect();

    Ok(RankMapping { clusters, by_raw })
}
