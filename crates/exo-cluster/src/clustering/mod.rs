//! Preprocessing, fitting, and rank stabilization

pub mod elbow;
mod kmeans;
mod preprocess;
mod profile;
mod stabilizer;

pub use elbow::{inertia_curve, ElbowPoint};
pub use kmeans::{ClusterAlgorithm, Fit, KMeans};
pub use preprocess::{transform, DEGENERATE_STD, LOG_EPSILON};
pub use profile::{build_profiles, ClusterProfile};
pub use stabilizer::{stabilize, RankMapping, RankedCluster};
