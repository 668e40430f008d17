//! Per-tier outcomes and the run summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::clustering::ClusterProfile;
use crate::error::FailureKind;
use crate::storage::TierRunRecord;

/// How a tier ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TierStatus {
    Succeeded {
        /// Clusters actually present (k')
        clusters: usize,
        /// Assignments written to the store
        persisted: usize,
        /// Previous assignments removed for planets no longer eligible
        cleared: usize,
        /// Per-rank summary, in rank order
        profiles: Vec<ClusterProfile>,
    },
    Failed {
        kind: FailureKind,
        reason: String,
        /// Previous assignments removed for planets no longer eligible
        cleared: usize,
    },
}

/// Result of one tier within a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierOutcome {
    pub tier: String,
    pub label_column: String,
    /// Eligible planets after membership resolution
    pub eligible: usize,
    /// Requested cluster count
    pub k: usize,
    pub status: TierStatus,
}

impl TierOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, TierStatus::Succeeded { .. })
    }

    /// Failure classification, if the tier failed
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.status {
            TierStatus::Failed { kind, .. } => Some(*kind),
            TierStatus::Succeeded { .. } => None,
        }
    }

    /// Profiles of a successful tier
    pub fn profiles(&self) -> &[ClusterProfile] {
        match &self.status {
            TierStatus::Succeeded { profiles, .. } => profiles,
            TierStatus::Failed { .. } => &[],
        }
    }

    /// Run log row for this outcome
    pub fn to_record(&self, run_id: Uuid) -> TierRunRecord {
        let (status, clusters, failure_kind, reason) = match &self.status {
            TierStatus::Succeeded { clusters, .. } => ("succeeded", Some(*clusters), None, None),
            TierStatus::Failed { kind, reason, .. } => {
                ("failed", None, Some(*kind), Some(reason.clone()))
            }
        };

        TierRunRecord {
            run_id,
            tier: self.tier.clone(),
            label_column: self.label_column.clone(),
            status: status.to_string(),
            eligible: self.eligible,
            k: self.k,
            clusters,
            failure_kind,
            reason,
        }
    }
}

/// Summary of a full pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per tier, in catalog order
    pub outcomes: Vec<TierOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Outcome for a tier by name
    pub fn outcome(&self, tier: &str) -> Option<&TierOutcome> {
        self.outcomes.iter().find(|o| o.tier == tier)
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run {} ({} ms)", self.run_id, self.duration_ms())?;
        writeln!(
            f,
            "{:<12} {:<14} {:>8} {:>3}  {}",
            "tier", "column", "eligible", "k", "status"
        )?;

        for outcome in &self.outcomes {
            let status = match &outcome.status {
                TierStatus::Succeeded { clusters, persisted, .. } => {
                    format!("ok: {} clusters, {} persisted", clusters, persisted)
                }
                TierStatus::Failed { kind, reason, cleared: 0 } => format!("{}: {}", kind, reason),
                TierStatus::Failed { kind, reason, cleared } => {
                    format!("{}: {} ({} cleared)", kind, reason, cleared)
                }
            };
            writeln!(
                f,
                "{:<12} {:<14} {:>8} {:>3}  {}",
                outcome.tier, outcome.label_column, outcome.eligible, outcome.k, status
            )?;

            for profile in outcome.profiles() {
                let means = profile
                    .means
                    .iter()
                    .map(|(feature, mean)| format!("{}={:.2}", feature, mean))
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(f, "    {:<24} n={:<4} {}", profile.label, profile.count, means)?;
            }
        }

        write!(f, "{} succeeded, {} failed", self.succeeded(), self.failed())
    }
}
