//! Tier declarations and startup validation
//!
//! A tier fixes which attributes a planet must have, how many clusters to
//! fit, and where the resulting ranks are persisted. Tiers are plain data;
//! the k values and feature sets come from configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::types::FeatureId;

/// Maximum length of a persisted label column name
const MAX_LABEL_COLUMN_LEN: usize = 63;

/// One data-completeness tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    /// Display name (unique within a catalog)
    pub name: String,
    /// Attributes every eligible planet must have, in matrix column order
    pub required_features: Vec<FeatureId>,
    /// Number of clusters to fit
    pub k: usize,
    /// Persisted column the stable ranks are written to
    pub label_column: String,
    /// Ingestion cohort a planet must belong to, if any
    #[serde(default)]
    pub cohort: Option<String>,
    /// Untransformed attribute used to order clusters
    #[serde(default = "default_ranking_feature")]
    pub ranking_feature: FeatureId,
}

fn default_ranking_feature() -> FeatureId { FeatureId::Radius }

impl Tier {
    /// Create a tier ranked by radius with no cohort restriction
    pub fn new(
        name: impl Into<String>,
        required_features: Vec<FeatureId>,
        k: usize,
        label_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            required_features,
            k,
            label_column: label_column.into(),
            cohort: None,
            ranking_feature: default_ranking_feature(),
        }
    }

    /// Restrict the tier to an ingestion cohort
    pub fn with_cohort(mut self, cohort: impl Into<String>) -> Self {
        self.cohort = Some(cohort.into());
        self
    }

    /// Order clusters by a different attribute
    pub fn with_ranking_feature(mut self, feature: FeatureId) -> Self {
        self.ranking_feature = feature;
        self
    }

    /// Column position of the ranking feature in this tier's matrix
    pub fn ranking_column(&self) -> Option<usize> {
        self.required_features
            .iter()
            .position(|f| *f == self.ranking_feature)
    }

    /// Check the invariants of a single tier
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::config("tier name must not be empty"));
        }

        if self.required_features.is_empty() {
            return Err(Error::config(format!(
                "tier '{}' requires at least one feature",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for feature in &self.required_features {
            if !seen.insert(*feature) {
                return Err(Error::config(format!(
                    "tier '{}' lists feature '{}' more than once",
                    self.name, feature
                )));
            }
        }

        if self.k < 2 {
            return Err(Error::config(format!(
                "tier '{}' must fit at least 2 clusters (k={})",
                self.name, self.k
            )));
        }

        if !is_valid_column_name(&self.label_column) {
            return Err(Error::config(format!(
                "tier '{}' has invalid label column '{}'",
                self.name, self.label_column
            )));
        }

        if self.ranking_column().is_none() {
            return Err(Error::config(format!(
                "tier '{}' ranks by '{}' which is not a required feature",
                self.name, self.ranking_feature
            )));
        }

        if let Some(cohort) = &self.cohort {
            if cohort.trim().is_empty() {
                return Err(Error::config(format!(
                    "tier '{}' has an empty cohort",
                    self.name
                )));
            }
        }

        Ok(())
    }
}

/// Lowercase identifier: `[a-z_][a-z0-9_]*`
fn is_valid_column_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    name.len() <= MAX_LABEL_COLUMN_LEN
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Validated, ordered set of tiers
#[derive(Debug, Clone)]
pub struct TierCatalog {
    tiers: Vec<Tier>,
}

impl TierCatalog {
    /// Validate and build a catalog. Fails on the first invalid tier.
    pub fn new(tiers: Vec<Tier>) -> Result<Self> {
        if tiers.is_empty() {
            return Err(Error::config("tier catalog is empty"));
        }

        let mut names = HashSet::new();
        let mut columns = HashSet::new();

        for tier in &tiers {
            tier.validate()?;

            if !names.insert(tier.name.as_str()) {
                return Err(Error::config(format!("duplicate tier name '{}'", tier.name)));
            }
            if !columns.insert(tier.label_column.as_str()) {
                return Err(Error::config(format!(
                    "label column '{}' is used by more than one tier",
                    tier.label_column
                )));
            }
        }

        Ok(Self { tiers })
    }

    /// Tiers in declaration order
    pub fn list_tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Look up a tier by name
    pub fn get(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.name == name)
    }

    /// Keep only the named tiers, preserving catalog order
    pub fn select(&self, names: &[String]) -> Result<Self> {
        for name in names {
            if self.get(name).is_none() {
                return Err(Error::config(format!("unknown tier '{}'", name)));
            }
        }

        Ok(Self {
            tiers: self
                .tiers
                .iter()
                .filter(|t| names.iter().any(|n| n == &t.name))
                .cloned()
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

/// The four analysis stages: detection parameters at k=3, full physical
/// profiles at k=4, each over a broad and a curated cohort.
pub fn default_tiers() -> Vec<Tier> {
    use FeatureId::*;

    let detection = vec![Radius, OrbitalPeriod, EquilibriumTemperature];
    let physical = vec![Mass, Radius, OrbitalPeriod, EquilibriumTemperature, Density];

    vec![
        Tier::new("Stage 1", detection.clone(), 3, "cluster_s1").with_cohort("stage1"),
        Tier::new("Stage 1c", detection, 3, "cluster_s1c").with_cohort("stage1c"),
        Tier::new("Stage 2", physical.clone(), 4, "cluster_s2").with_cohort("stage2"),
        Tier::new("Stage 2c", physical, 4, "cluster_s2c").with_cohort("stage2c"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = TierCatalog::new(default_tiers()).unwrap();
        let tiers = catalog.list_tiers();

        assert_eq!(tiers.len(), 4);
        assert_eq!(tiers[0].name, "Stage 1");
        assert_eq!(tiers[0].k, 3);
        assert_eq!(tiers[3].k, 4);
        assert_eq!(tiers[3].required_features.len(), 5);
        assert_eq!(tiers[2].cohort.as_deref(), Some("stage2"));
        assert!(tiers.iter().all(|t| t.ranking_feature == FeatureId::Radius));
    }

    #[test]
    fn test_rejects_small_k() {
        let tier = Tier::new("t", vec![FeatureId::Radius], 1, "cluster_t");
        assert!(tier.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_or_duplicate_features() {
        let empty = Tier::new("t", vec![], 2, "cluster_t");
        assert!(empty.validate().is_err());

        let dup = Tier::new("t", vec![FeatureId::Radius, FeatureId::Radius], 2, "cluster_t");
        assert!(dup.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_label_column() {
        for column in ["", "Cluster", "1cluster", "cluster s1", "cluster;drop", "cluster-s1"] {
            let tier = Tier::new("t", vec![FeatureId::Radius], 2, column);
            assert!(tier.validate().is_err(), "accepted '{}'", column);
        }
        let tier = Tier::new("t", vec![FeatureId::Radius], 2, "_cluster_2");
        assert!(tier.validate().is_ok());
    }

    #[test]
    fn test_ranking_feature_must_be_required() {
        let tier = Tier::new("t", vec![FeatureId::Mass], 2, "cluster_t");
        assert!(tier.validate().is_err());

        let tier = tier.with_ranking_feature(FeatureId::Mass);
        assert!(tier.validate().is_ok());
        assert_eq!(tier.ranking_column(), Some(0));
    }

    #[test]
    fn test_rejects_duplicate_names_and_columns() {
        let a = Tier::new("a", vec![FeatureId::Radius], 2, "cluster_a");
        let b = Tier::new("a", vec![FeatureId::Radius], 2, "cluster_b");
        assert!(TierCatalog::new(vec![a.clone(), b]).is_err());

        let c = Tier::new("c", vec![FeatureId::Radius], 2, "cluster_a");
        assert!(TierCatalog::new(vec![a, c]).is_err());

        assert!(TierCatalog::new(vec![]).is_err());
    }

    #[test]
    fn test_select() {
        let catalog = TierCatalog::new(default_tiers()).unwrap();
        let selected = catalog
            .select(&["Stage 2c".to_string(), "Stage 1".to_string()])
            .unwrap();

        let names: Vec<_> = selected.list_tiers().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Stage 1", "Stage 2c"]);

        assert!(catalog.select(&["Stage 9".to_string()]).is_err());
    }
}
