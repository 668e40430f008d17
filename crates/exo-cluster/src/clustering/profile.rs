//! Per-rank cluster profiles: member counts and mean raw attribute values

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::types::FeatureId;

use super::stabilizer::RankMapping;

/// Summary of one ranked cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterProfile {
    pub rank: usize,
    pub label: String,
    pub count: usize,
    /// Mean untransformed value per required feature, in tier order
    pub means: Vec<(FeatureId, f64)>,
}

impl ClusterProfile {
    /// Mean of one feature, if the tier uses it
    pub fn mean_of(&self, feature: FeatureId) -> Option<f64> {
        self.means
            .iter()
            .find(|(f, _)| *f == feature)
            .map(|(_, v)| *v)
    }
}

/// Build one profile per rank from raw features and fitted labels
pub fn build_profiles(
    features: &[FeatureId],
    raw: &Array2<f64>,
    labels: &[usize],
    mapping: &RankMapping,
) -> Vec<ClusterProfile> {
    mapping
        .clusters()
        .iter()
        .map(|cluster| {
            let members: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|(_, l)| **l == cluster.raw_index)
                .map(|(i, _)| i)
                .collect();

            let count = members.len();
            let means = features
                .iter()
                .enumerate()
                .map(|(j, feature)| {
                    let sum: f64 = members.iter().map(|&i| raw[[i, j]]).sum();
                    (*feature, sum / count.max(1) as f64)
                })
                .collect();

            ClusterProfile {
                rank: cluster.rank.rank,
                label: cluster.rank.label.clone(),
                count,
                means,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::stabilize;
    use ndarray::array;

    #[test]
    fn test_profiles_follow_rank_order() {
        let features = [FeatureId::Radius, FeatureId::OrbitalPeriod];
        let raw = array![[1.0, 10.0], [2.0, 20.0], [10.0, 300.0], [12.0, 500.0]];
        let labels = [1, 1, 0, 0];
        let mapping = stabilize(&labels, &[1.0, 2.0, 10.0, 12.0]).unwrap();

        let profiles = build_profiles(&features, &raw, &labels, &mapping);

        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].rank, 1);
        assert_eq!(profiles[0].count, 2);
        assert_eq!(profiles[0].mean_of(FeatureId::Radius), Some(1.5));
        assert_eq!(profiles[1].mean_of(FeatureId::OrbitalPeriod), Some(400.0));
        assert_eq!(profiles[1].mean_of(FeatureId::Mass), None);
    }
}
