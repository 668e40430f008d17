//! Configuration for the clustering pipeline
//!
//! Built once and handed to [`crate::pipeline::Pipeline::new`]. Nothing here
//! is cached in process-wide state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::tiers::{Tier, TierCatalog};

/// Main pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Persisted store configuration
    pub database: DatabaseConfig,
    /// Clustering algorithm configuration
    pub clustering: ClusteringConfig,
    /// Driver behaviour
    pub pipeline: DriverConfig,
    /// Ingestion options
    pub ingest: IngestConfig,
    /// Tier declarations. Empty means the built-in catalog.
    pub tiers: Vec<Tier>,
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config '{}': {}", path.display(), e))
        })?;
        let config: PipelineConfig = toml::from_str(&raw)?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Build and validate the tier catalog this configuration describes
    pub fn catalog(&self) -> Result<TierCatalog> {
        if self.tiers.is_empty() {
            TierCatalog::new(crate::tiers::default_tiers())
        } else {
            TierCatalog::new(self.tiers.clone())
        }
    }
}

/// SQLite store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path of the SQLite database file
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("exo-cluster")
            .join("exoplanets.db");

        Self { path }
    }
}

/// K-means configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Seed for centroid initialization
    pub seed: u64,
    /// Number of independent initializations; the lowest inertia wins
    pub n_init: usize,
    /// Maximum Lloyd iterations per initialization
    pub max_iter: usize,
    /// Centroid shift below which a run counts as converged
    pub tol: f64,
    /// Treat a run where no initialization converged as a failure
    pub fail_on_non_convergence: bool,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
            fail_on_non_convergence: false,
        }
    }
}

/// Pipeline driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Tiers with fewer eligible planets than `max(k, min_population)` are skipped
    pub min_population: usize,
    /// Run tiers on the rayon pool instead of one after another
    pub parallel_tiers: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            min_population: 10,
            parallel_tiers: false,
        }
    }
}

/// Ingestion options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Fill a missing density from mass and radius when both are known
    pub derive_density: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FeatureId;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.clustering.seed, 42);
        assert_eq!(config.clustering.n_init, 10);
        assert_eq!(config.pipeline.min_population, 10);
        assert!(!config.pipeline.parallel_tiers);
        assert_eq!(config.catalog().unwrap().len(), 4);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[database]
path = "/tmp/exo.db"

[clustering]
seed = 7

[pipeline]
min_population = 3

[[tiers]]
name = "Radius only"
required_features = ["pl_rade", "pl_orbper"]
k = 2
label_column = "cluster_radius"
"#
        )
        .unwrap();

        let config = PipelineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/exo.db"));
        assert_eq!(config.clustering.seed, 7);
        assert_eq!(config.clustering.max_iter, 300);
        assert_eq!(config.pipeline.min_population, 3);

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.len(), 1);
        let tier = &catalog.list_tiers()[0];
        assert_eq!(tier.required_features, vec![FeatureId::Radius, FeatureId::OrbitalPeriod]);
        assert_eq!(tier.ranking_feature, FeatureId::Radius);
        assert_eq!(tier.cohort, None);
    }

    #[test]
    fn test_invalid_tier_rejected_at_startup() {
        let config: PipelineConfig = toml::from_str(
            r#"
[[tiers]]
name = "Bad"
required_features = ["pl_rade"]
k = 1
label_column = "cluster_bad"
"#,
        )
        .unwrap();

        assert!(matches!(config.catalog(), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = PipelineConfig::from_file("/nonexistent/exo-cluster.toml");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
