//! Pipeline driver: runs every tier and isolates tier failures

use chrono::Utc;
use rayon::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::clustering::{build_profiles, stabilize, transform, ClusterAlgorithm, ClusterProfile, KMeans};
use crate::config::PipelineConfig;
use crate::error::{Error, FailureKind, Result};
use crate::storage::{AssignmentStore, PersistStats};
use crate::tiers::{resolve, Membership, Tier, TierCatalog};
use crate::types::{ClusterAssignment, Planet};

use super::report::{RunReport, TierOutcome, TierStatus};

/// Computed result of one tier before it is reported
#[derive(Debug, Clone)]
pub struct TierResult {
    pub assignments: Vec<ClusterAssignment>,
    pub profiles: Vec<ClusterProfile>,
    pub clusters: usize,
    pub inertia: f64,
}

/// Staged clustering pipeline
///
/// Owns its configuration, catalog, and store handle for the lifetime of the
/// run. Nothing is read from process-wide state.
pub struct Pipeline {
    config: PipelineConfig,
    catalog: TierCatalog,
    store: Arc<dyn AssignmentStore>,
    algorithm: Arc<dyn ClusterAlgorithm>,
}

impl Pipeline {
    /// Create a pipeline using k-means built from `config.clustering`
    pub fn new(config: PipelineConfig, catalog: TierCatalog, store: Arc<dyn AssignmentStore>) -> Self {
        let algorithm = Arc::new(KMeans::from_config(&config.clustering));

        Self {
            config,
            catalog,
            store,
            algorithm,
        }
    }

    /// Swap in a different clustering algorithm
    pub fn with_algorithm(mut self, algorithm: Arc<dyn ClusterAlgorithm>) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn catalog(&self) -> &TierCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every tier in the catalog
    ///
    /// Never fails as a whole: each tier yields exactly one outcome.
    pub fn run(&self, planets: &[Planet]) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let tiers = self.catalog.list_tiers();

        tracing::info!(
            "Run {} started: {} tiers over {} planets (seed {})",
            run_id,
            tiers.len(),
            planets.len(),
            self.config.clustering.seed
        );

        let outcomes: Vec<TierOutcome> = if self.config.pipeline.parallel_tiers {
            tiers
                .par_iter()
                .map(|tier| self.execute_tier(run_id, tier, planets))
                .collect()
        } else {
            tiers
                .iter()
                .map(|tier| self.execute_tier(run_id, tier, planets))
                .collect()
        };

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        tracing::info!(
            "Run {} complete: {} tiers succeeded, {} failed",
            run_id,
            report.succeeded(),
            report.failed()
        );
        report
    }

    /// Run one tier and convert its result into an outcome
    fn execute_tier(&self, run_id: Uuid, tier: &Tier, planets: &[Planet]) -> TierOutcome {
        let membership = resolve(tier, planets);
        let eligible = membership.len();

        tracing::info!(
            "{}: {} eligible ({} missing features, {} outside cohort)",
            tier.name,
            eligible,
            membership.dropped_missing,
            membership.dropped_cohort
        );

        let status = match self.cluster_and_persist(tier, &membership) {
            Ok((result, stats)) => {
                tracing::info!(
                    "{}: {} clusters, {} assignments persisted to {}",
                    tier.name,
                    result.clusters,
                    stats.written,
                    tier.label_column
                );
                TierStatus::Succeeded {
                    clusters: result.clusters,
                    persisted: stats.written,
                    cleared: stats.cleared,
                    profiles: result.profiles,
                }
            }
            Err(e) => {
                let kind = e.failure_kind();
                if kind == FailureKind::IneligiblePopulation {
                    tracing::warn!("{}: skipped: {}", tier.name, e);
                } else {
                    tracing::error!("{}: failed ({}): {}", tier.name, kind, e);
                }

                let names: Vec<&str> = membership.eligible.iter().map(|p| p.name.as_str()).collect();
                let cleared = match self.store.clear_ineligible(tier, &names) {
                    Ok(cleared) => cleared,
                    Err(clear_err) => {
                        tracing::error!(
                            "{}: failed to clear ineligible assignments: {}",
                            tier.name,
                            clear_err
                        );
                        0
                    }
                };

                TierStatus::Failed {
                    kind,
                    reason: e.to_string(),
                    cleared,
                }
            }
        };

        let outcome = TierOutcome {
            tier: tier.name.clone(),
            label_column: tier.label_column.clone(),
            eligible,
            k: tier.k,
            status,
        };

        if let Err(e) = self.store.record_run(&outcome.to_record(run_id)) {
            tracing::warn!("{}: failed to record run log entry: {}", tier.name, e);
        }

        outcome
    }

    fn cluster_and_persist(
        &self,
        tier: &Tier,
        membership: &Membership<'_>,
    ) -> Result<(TierResult, PersistStats)> {
        let result = self.cluster_membership(tier, membership)?;
        let stats = self.store.persist_tier(tier, &result.assignments)?;
        Ok((result, stats))
    }

    /// Compute one tier's assignments without persisting them
    pub fn run_tier(&self, tier: &Tier, planets: &[Planet]) -> Result<TierResult> {
        let membership = resolve(tier, planets);
        self.cluster_membership(tier, &membership)
    }

    fn cluster_membership(&self, tier: &Tier, membership: &Membership<'_>) -> Result<TierResult> {
        let rows = membership.len();
        let required = tier.k.max(self.config.pipeline.min_population);
        if rows < required {
            return Err(Error::InsufficientPopulation {
                rows,
                k: tier.k,
                required,
            });
        }

        let standardized = transform(&membership.features, &tier.required_features)?;

        let fit = self
            .algorithm
            .fit(&standardized, tier.k, self.config.clustering.seed)?;
        tracing::debug!(
            "{}: {} fit in {} iterations, inertia {:.4}",
            tier.name,
            self.algorithm.name(),
            fit.iterations,
            fit.inertia
        );

        let ranking_column = tier.ranking_column().ok_or_else(|| {
            Error::config(format!(
                "tier '{}' ranks by {} which it does not require",
                tier.name, tier.ranking_feature
            ))
        })?;
        let mapping = stabilize(&fit.labels, &membership.column_values(ranking_column))?;

        let assignments = membership
            .eligible
            .iter()
            .zip(&fit.labels)
            .map(|(planet, &raw_index)| {
                let rank = mapping.get(raw_index).ok_or_else(|| {
                    Error::internal(format!("raw index {} missing from rank mapping", raw_index))
                })?;
                Ok(ClusterAssignment {
                    planet_name: planet.name.clone(),
                    raw_index,
                    rank: rank.rank,
                    label: rank.label.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let profiles = build_profiles(
            &tier.required_features,
            &membership.features,
            &fit.labels,
            &mapping,
        );

        Ok(TierResult {
            assignments,
            profiles,
            clusters: mapping.cluster_count(),
            inertia: fit.inertia,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::Fit;
    use crate::types::FeatureId;
    use ndarray::Array2;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Store that keeps assignments in memory and can be told to reject a column
    #[derive(Default)]
    struct MemoryStore {
        columns: Mutex<HashMap<String, Vec<ClusterAssignment>>>,
        reject: Option<String>,
    }

    impl AssignmentStore for MemoryStore {
        fn persist_tier(&self, tier: &Tier, assignments: &[ClusterAssignment]) -> Result<PersistStats> {
            if self.reject.as_deref() == Some(tier.label_column.as_str()) {
                return Err(Error::persistence_conflict(&tier.label_column, "rejected"));
            }
            self.columns
                .lock()
                .insert(tier.label_column.clone(), assignments.to_vec());
            Ok(PersistStats {
                written: assignments.len(),
                ..Default::default()
            })
        }

        fn clear_ineligible(&self, tier: &Tier, eligible: &[&str]) -> Result<usize> {
            let mut columns = self.columns.lock();
            let Some(rows) = columns.get_mut(&tier.label_column) else {
                return Ok(0);
            };
            let before = rows.len();
            rows.retain(|a| eligible.contains(&a.planet_name.as_str()));
            Ok(before - rows.len())
        }
    }

    /// Puts the first half of the rows in raw cluster 1, the rest in 0
    struct SplitInHalf;

    impl ClusterAlgorithm for SplitInHalf {
        fn name(&self) -> &str {
            "split"
        }

        fn fit(&self, data: &Array2<f64>, _k: usize, _seed: u64) -> Result<Fit> {
            let n = data.nrows();
            Ok(Fit {
                labels: (0..n).map(|i| if i < n / 2 { 1 } else { 0 }).collect(),
                inertia: 0.0,
                iterations: 1,
                converged: true,
            })
        }
    }

    fn planets(n: usize) -> Vec<Planet> {
        (0..n)
            .map(|i| {
                Planet::new(format!("P{}", i), "S")
                    .with_feature(FeatureId::Radius, 1.0 + i as f64)
                    .with_feature(FeatureId::OrbitalPeriod, 10.0 * (i + 1) as f64)
            })
            .collect()
    }

    fn catalog() -> TierCatalog {
        TierCatalog::new(vec![
            Tier::new("small", vec![FeatureId::Radius, FeatureId::OrbitalPeriod], 2, "cluster_small"),
            Tier::new("big", vec![FeatureId::Radius, FeatureId::OrbitalPeriod], 8, "cluster_big"),
        ])
        .unwrap()
    }

    fn config(min_population: usize) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.pipeline.min_population = min_population;
        config
    }

    #[test]
    fn test_ineligible_tier_does_not_stop_others() {
        let store = Arc::new(MemoryStore::default());
        let pipeline = Pipeline::new(config(2), catalog(), store.clone());

        let report = pipeline.run(&planets(6));

        assert_eq!(report.outcomes.len(), 2);
        assert!(report.outcomes[0].is_success());
        assert_eq!(
            report.outcomes[1].failure_kind(),
            Some(FailureKind::IneligiblePopulation)
        );
        assert!(store.columns.lock().contains_key("cluster_small"));
        assert!(!store.columns.lock().contains_key("cluster_big"));
    }

    #[test]
    fn test_min_population_threshold() {
        let store = Arc::new(MemoryStore::default());
        let pipeline = Pipeline::new(config(10), catalog(), store);

        let report = pipeline.run(&planets(6));
        assert!(report
            .outcomes
            .iter()
            .all(|o| o.failure_kind() == Some(FailureKind::IneligiblePopulation)));
    }

    #[test]
    fn test_ranks_follow_ranking_feature() {
        let store = Arc::new(MemoryStore::default());
        let pipeline = Pipeline::new(config(2), catalog(), store).with_algorithm(Arc::new(SplitInHalf));

        let tier = &pipeline.catalog().list_tiers()[0];
        let result = pipeline.run_tier(tier, &planets(4)).unwrap();

        // first half has the smaller radii and raw index 1
        let ranks: Vec<usize> = result.assignments.iter().map(|a| a.rank).collect();
        assert_eq!(ranks, vec![1, 1, 2, 2]);
        assert_eq!(result.assignments[0].raw_index, 1);
        assert_eq!(result.assignments[3].label, "Cluster #2 (Largest)");
        assert_eq!(result.profiles[0].mean_of(FeatureId::Radius), Some(1.5));
    }

    #[test]
    fn test_persistence_conflict_is_tier_local() {
        let store = Arc::new(MemoryStore {
            reject: Some("cluster_small".to_string()),
            ..Default::default()
        });
        let catalog = TierCatalog::new(vec![
            Tier::new("small", vec![FeatureId::Radius], 2, "cluster_small"),
            Tier::new("other", vec![FeatureId::Radius], 2, "cluster_other"),
        ])
        .unwrap();
        let pipeline = Pipeline::new(config(2), catalog, store.clone());

        let report = pipeline.run(&planets(6));

        assert_eq!(
            report.outcomes[0].failure_kind(),
            Some(FailureKind::PersistenceConflict)
        );
        assert!(report.outcomes[1].is_success());
        assert_eq!(store.columns.lock()["cluster_other"].len(), 6);
    }

    #[test]
    fn test_failed_tier_clears_planets_no_longer_eligible() {
        let store = Arc::new(MemoryStore::default());
        let catalog = TierCatalog::new(vec![Tier::new(
            "small",
            vec![FeatureId::Radius],
            2,
            "cluster_small",
        )])
        .unwrap();

        let mut population = planets(6);
        let first = Pipeline::new(config(2), catalog.clone(), store.clone()).run(&population);
        assert!(first.outcomes[0].is_success());

        population[0].set_feature(FeatureId::Radius, None);
        let second = Pipeline::new(config(100), catalog, store.clone()).run(&population);

        match &second.outcomes[0].status {
            TierStatus::Failed { kind, cleared, .. } => {
                assert_eq!(*kind, FailureKind::IneligiblePopulation);
                assert_eq!(*cleared, 1);
            }
            other => panic!("unexpected status {:?}", other),
        }
        let remaining = &store.columns.lock()["cluster_small"];
        assert_eq!(remaining.len(), 5);
        assert!(remaining.iter().all(|a| a.planet_name != "P0"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = Pipeline::new(config(2), catalog(), Arc::new(MemoryStore::default()));
        let mut parallel_config = config(2);
        parallel_config.pipeline.parallel_tiers = true;
        let parallel = Pipeline::new(parallel_config, catalog(), Arc::new(MemoryStore::default()));

        let a = sequential.run(&planets(12));
        let b = parallel.run(&planets(12));

        assert_eq!(a.outcomes, b.outcomes);
    }
}
