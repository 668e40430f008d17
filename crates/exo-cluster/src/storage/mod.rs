//! Storage module for persistent data storage
//!
//! Provides SQLite-based persistence for the planet catalog and per-tier
//! cluster assignments.

mod database;

use uuid::Uuid;

use crate::error::{FailureKind, Result};
use crate::tiers::Tier;
use crate::types::ClusterAssignment;

pub use database::{ExoplanetDb, ImportStats, IntegrityReport};

/// Outcome of writing one tier's assignments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistStats {
    /// Rows upserted
    pub written: usize,
    /// Planets whose previous assignment was removed because they are no
    /// longer eligible
    pub cleared: usize,
    /// Assignments dropped on retry because the store did not know the planet
    pub rejected: usize,
}

/// One row of the tier run log
#[derive(Debug, Clone, PartialEq)]
pub struct TierRunRecord {
    pub run_id: Uuid,
    pub tier: String,
    pub label_column: String,
    pub status: String,
    pub eligible: usize,
    pub k: usize,
    pub clusters: Option<usize>,
    pub failure_kind: Option<FailureKind>,
    pub reason: Option<String>,
}

/// Destination of tier assignments
///
/// `persist_tier` must be atomic per tier: either every assignment in the
/// slice is stored (and eligible-set leavers are cleared) or nothing changes.
pub trait AssignmentStore: Send + Sync {
    /// Replace the stored contents of `tier`'s label column
    fn persist_tier(&self, tier: &Tier, assignments: &[ClusterAssignment]) -> Result<PersistStats>;

    /// Remove rows of `tier`'s label column for planets not in `eligible`
    ///
    /// Used when a tier cannot produce assignments, so that no planet keeps a
    /// rank from an earlier run it is no longer eligible for. Returns the
    /// number of rows removed.
    fn clear_ineligible(&self, tier: &Tier, eligible: &[&str]) -> Result<usize>;

    /// Append a tier outcome to the run log
    fn record_run(&self, _record: &TierRunRecord) -> Result<()> {
        Ok(())
    }
}
