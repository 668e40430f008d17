//! Elbow analysis: inertia as a function of k
//!
//! Used to sanity-check the k values declared for each tier. Not part of
//! the assignment pipeline.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::kmeans::ClusterAlgorithm;

/// Inertia of the best fit for one k
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElbowPoint {
    pub k: usize,
    pub inertia: f64,
}

/// Fit k = 1..=max_k (capped at the row count) and collect inertia
pub fn inertia_curve(
    algorithm: &dyn ClusterAlgorithm,
    data: &Array2<f64>,
    max_k: usize,
    seed: u64,
) -> Result<Vec<ElbowPoint>> {
    let upper = max_k.min(data.nrows());
    let mut points = Vec::with_capacity(upper);

    for k in 1..=upper {
        let fit = algorithm.fit(data, k, seed)?;
        points.push(ElbowPoint {
            k,
            inertia: fit.inertia,
        });
    }

    Ok(points)
}
