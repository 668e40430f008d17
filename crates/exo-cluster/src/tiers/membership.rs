//! Tier membership: which planets a tier clusters, and their raw features

use ndarray::Array2;

use crate::types::Planet;

use super::Tier;

/// Planets eligible for one tier plus their raw feature matrix
#[derive(Debug, Clone)]
pub struct Membership<'a> {
    /// Eligible planets, in input order
    pub eligible: Vec<&'a Planet>,
    /// One row per eligible planet, one column per required feature
    pub features: Array2<f64>,
    /// Planets in the cohort but missing a required feature
    pub dropped_missing: usize,
    /// Planets outside the tier's cohort
    pub dropped_cohort: usize,
}

impl<'a> Membership<'a> {
    pub fn len(&self) -> usize {
        self.eligible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eligible.is_empty()
    }

    /// Untransformed values of one feature column
    pub fn column_values(&self, column: usize) -> Vec<f64> {
        self.features.column(column).to_vec()
    }
}

/// True when `planet` may take part in `tier`'s clustering
///
/// Every required feature must be present. Missing values are never
/// imputed or zero-filled.
pub fn is_eligible(tier: &Tier, planet: &Planet) -> bool {
    in_cohort(tier, planet) && planet.has_features(&tier.required_features)
}

fn in_cohort(tier: &Tier, planet: &Planet) -> bool {
    tier.cohort
        .as_deref()
        .map_or(true, |cohort| planet.has_cohort(cohort))
}

/// Select the planets eligible for `tier` and build their feature matrix
pub fn resolve<'a>(tier: &Tier, planets: &'a [Planet]) -> Membership<'a> {
    let mut eligible = Vec::new();
    let mut dropped_missing = 0;
    let mut dropped_cohort = 0;

    for planet in planets {
        if is_eligible(tier, planet) {
            eligible.push(planet);
        } else if in_cohort(tier, planet) {
            dropped_missing += 1;
        } else {
            dropped_cohort += 1;
        }
    }

    let cols = tier.required_features.len();
    let mut features = Array2::<f64>::zeros((eligible.len(), cols));
    for (i, planet) in eligible.iter().enumerate() {
        for (j, feature) in tier.required_features.iter().enumerate() {
            // is_eligible guaranteed presence above
            if let Some(value) = planet.feature(*feature) {
                features[[i, j]] = value;
            }
        }
    }

    if dropped_missing > 0 {
        tracing::debug!(
            "{}: dropped {} planets missing one of {:?}",
            tier.name,
            dropped_missing,
            tier.required_features
        );
    }

    Membership {
        eligible,
        features,
        dropped_missing,
        dropped_cohort,
    }
}
