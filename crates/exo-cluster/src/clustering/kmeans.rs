//! Cluster fitting contract and a seeded k-means implementation
//!
//! The pipeline only depends on [`ClusterAlgorithm`]: fit `k` groups and
//! return one label per input row, in row order. Identical input and seed
//! must produce identical labels.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ClusteringConfig;
use crate::error::{Error, Result};

/// Outcome of one clustering fit
#[derive(Debug, Clone, PartialEq)]
pub struct Fit {
    /// Raw cluster index per row, each in `[0, k)`
    pub labels: Vec<usize>,
    /// Sum of squared distances to the assigned centroid
    pub inertia: f64,
    /// Iterations used by the winning initialization
    pub iterations: usize,
    /// Whether the winning initialization converged
    pub converged: bool,
}

/// Partitioning algorithm used by the pipeline
pub trait ClusterAlgorithm: Send + Sync {
    /// Algorithm name for logs
    fn name(&self) -> &str;

    /// Partition the rows of `data` into `k` groups
    fn fit(&self, data: &Array2<f64>, k: usize, seed: u64) -> Result<Fit>;
}

/// Lloyd's k-means with k-means++ seeding and multiple restarts
#[derive(Debug, Clone)]
pub struct KMeans {
    n_init: usize,
    max_iter: usize,
    tol: f64,
    fail_on_non_convergence: bool,
}

impl Default for KMeans {
    fn default() -> Self {
        Self::from_config(&ClusteringConfig::default())
    }
}

impl KMeans {
    /// Create a k-means fitter
    pub fn new(n_init: usize, max_iter: usize, tol: f64) -> Self {
        Self {
            n_init: n_init.max(1),
            max_iter: max_iter.max(1),
            tol,
            fail_on_non_convergence: false,
        }
    }

    /// Build from the clustering section of the pipeline config
    pub fn from_config(config: &ClusteringConfig) -> Self {
        Self::new(config.n_init, config.max_iter, config.tol)
            .with_strict_convergence(config.fail_on_non_convergence)
    }

    /// Report [`Error::NonConvergence`] when no initialization converges
    pub fn with_strict_convergence(mut self, strict: bool) -> Self {
        self.fail_on_non_convergence = strict;
        self
    }

    /// One k-means++ initialization followed by Lloyd iterations
    fn run_once(&self, data: &Array2<f64>, k: usize, tol: f64, rng: &mut StdRng) -> Fit {
        let mut centroids = kmeans_plus_plus(data, k, rng);
        let mut labels = assign(data, &centroids);
        let mut iterations = self.max_iter;
        let mut converged = false;

        for iter in 1..=self.max_iter {
            let updated = update_centroids(data, &labels, &centroids);
            let shift: f64 = centroids
                .rows()
                .into_iter()
                .zip(updated.rows())
                .map(|(old, new)| squared_distance(old, new))
                .sum();

            centroids = updated;
            labels = assign(data, &centroids);

            if shift <= tol {
                iterations = iter;
                converged = true;
                break;
            }
        }

        let inertia = inertia(data, &labels, &centroids);
        Fit {
            labels,
            inertia,
            iterations,
            converged,
        }
    }
}

impl ClusterAlgorithm for KMeans {
    fn name(&self) -> &str {
        "k-means"
    }

    fn fit(&self, data: &Array2<f64>, k: usize, seed: u64) -> Result<Fit> {
        let rows = data.nrows();

        if k == 0 {
            return Err(Error::invalid_input("k must be at least 1"));
        }
        if rows < k {
            return Err(Error::InsufficientPopulation { rows, k, required: k });
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(Error::invalid_input("input matrix contains non-finite values"));
        }

        // Tolerance is relative to the data's spread, as in common k-means tooling
        let tol = self.tol * mean_variance(data);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut best: Option<Fit> = None;

        for _ in 0..self.n_init {
            let fit = self.run_once(data, k, tol, &mut rng);
            let better = best.as_ref().map_or(true, |b| fit.inertia < b.inertia);
            if better {
                best = Some(fit);
            }
        }

        let best = best.ok_or_else(|| Error::internal("k-means ran zero initializations"))?;

        if !best.converged {
            if self.fail_on_non_convergence {
                return Err(Error::NonConvergence {
                    iterations: self.max_iter,
                });
            }
            tracing::warn!(
                "k-means did not converge within {} iterations (k={}, rows={}); keeping best partition",
                self.max_iter,
                k,
                rows
            );
        }

        tracing::debug!(
            "k-means fit: k={}, rows={}, inertia={:.4}, iterations={}",
            k,
            rows,
            best.inertia,
            best.iterations
        );

        Ok(best)
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Mean per-column variance, used to scale the convergence tolerance
fn mean_variance(data: &Array2<f64>) -> f64 {
    let cols = data.ncols();
    if cols == 0 {
        return 0.0;
    }
    data.columns()
        .into_iter()
        .map(|c| c.var(0.0))
        .sum::<f64>()
        / cols as f64
}

/// Choose `k` initial centroids, each new one sampled proportionally to its
/// squared distance from the nearest centroid already chosen
fn kmeans_plus_plus(data: &Array2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let (rows, cols) = data.dim();
    let mut centroids = Array2::<f64>::zeros((k, cols));

    let first = rng.gen_range(0..rows);
    centroids.row_mut(0).assign(&data.row(first));

    let mut nearest: Vec<f64> = data
        .rows()
        .into_iter()
        .map(|row| squared_distance(row, centroids.row(0)))
        .collect();

    for c in 1..k {
        let total: f64 = nearest.iter().sum();

        let chosen = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut pick = rows - 1;
            for (i, d) in nearest.iter().enumerate() {
                cumulative += d;
                if cumulative >= target && *d > 0.0 {
                    pick = i;
                    break;
                }
            }
            pick
        } else {
            // Every point coincides with a centroid
            rng.gen_range(0..rows)
        };

        centroids.row_mut(c).assign(&data.row(chosen));

        for (i, row) in data.rows().into_iter().enumerate() {
            let d = squared_distance(row, centroids.row(c));
            if d < nearest[i] {
                nearest[i] = d;
            }
        }
    }

    centroids
}

/// Nearest centroid per row; ties go to the lower index
fn assign(data: &Array2<f64>, centroids: &Array2<f64>) -> Vec<usize> {
    data.rows()
        .into_iter()
        .map(|row| {
            let mut best = 0;
            let mut best_dist = f64::INFINITY;
            for (c, centroid) in centroids.rows().into_iter().enumerate() {
                let d = squared_distance(row, centroid);
                if d < best_dist {
                    best_dist = d;
                    best = c;
                }
            }
            best
        })
        .collect()
}

/// Mean of each cluster's members. Empty clusters keep their previous centroid.
fn update_centroids(data: &Array2<f64>, labels: &[usize], previous: &Array2<f64>) -> Array2<f64> {
    let (k, cols) = previous.dim();
    let mut sums = Array2::<f64>::zeros((k, cols));
    let mut counts = vec![0usize; k];

    for (row, &label) in data.rows().into_iter().zip(labels) {
        let mut sum = sums.row_mut(label);
        sum += &row;
        counts[label] += 1;
    }

    for (c, count) in counts.iter().enumerate() {
        if *count == 0 {
            sums.row_mut(c).assign(&previous.row(c));
        } else {
            sums.row_mut(c).mapv_inplace(|v| v / *count as f64);
        }
    }

    sums
}

fn inertia(data: &Array2<f64>, labels: &[usize], centroids: &Array2<f64>) -> f64 {
    data.rows()
        .into_iter()
        .zip(labels)
        .map(|(row, &label)| squared_distance(row, centroids.row(label)))
        .sum()
}
