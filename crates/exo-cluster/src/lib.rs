//! exo-cluster: tiered exoplanet clustering with rank-stable labels
//!
//! Planets are grouped under several data-completeness tiers. Each tier
//! selects the planets that have every attribute it requires, log-compresses
//! and standardizes those attributes, fits k-means, and relabels the arbitrary
//! cluster indices by ascending mean radius so that "Cluster #1 (Smallest)"
//! means the same thing in every tier and on every re-run. Results are
//! upserted into SQLite, one label column per tier.

pub mod clustering;
pub mod config;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod sample_data;
pub mod storage;
pub mod tiers;
pub mod types;

pub use config::PipelineConfig;
pub use error::{Error, FailureKind, Result};
pub use pipeline::{Pipeline, RunReport, TierOutcome, TierStatus};
pub use storage::{AssignmentStore, ExoplanetDb};
pub use tiers::{Tier, TierCatalog};
pub use types::{
    assignment::{ClusterAssignment, PersistedAssignment, StableRank},
    planet::{Discovery, FeatureId, HostStar, Planet},
};
