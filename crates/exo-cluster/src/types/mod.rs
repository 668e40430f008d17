//! Core record types

pub mod assignment;
pub mod planet;

pub use assignment::{rank_label, ClusterAssignment, PersistedAssignment, StableRank};
pub use planet::{Discovery, FeatureId, HostStar, Planet};
