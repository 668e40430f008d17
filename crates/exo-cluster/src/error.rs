//! Error types for the clustering pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::FeatureId;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (invalid tier catalog, unreadable config)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Fewer rows than clusters requested, or below the configured minimum
    #[error("Insufficient population: {rows} rows for k={k} (need at least {required})")]
    InsufficientPopulation { rows: usize, k: usize, required: usize },

    /// A feature column has no spread after log compression
    #[error("Degenerate preprocessing: feature '{feature}' has zero variance")]
    DegeneratePreprocessing { feature: FeatureId },

    /// A feature value cannot be log-compressed
    #[error("Invalid value {value} for feature '{feature}'")]
    InvalidFeatureValue { feature: FeatureId, value: f64 },

    /// The clustering algorithm reported failure to converge
    #[error("Clustering did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },

    /// Malformed input handed to an algorithm stage
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The store rejected a tier's write even after key correction
    #[error("Persistence conflict for '{label_column}': {message}")]
    PersistenceConflict { label_column: String, message: String },

    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a tier failure, as shown in run summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    IneligiblePopulation,
    DegeneratePreprocessing,
    AlgorithmFailure,
    PersistenceConflict,
    Internal,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::IneligiblePopulation => write!(f, "ineligible_population"),
            FailureKind::DegeneratePreprocessing => write!(f, "degenerate_preprocessing"),
            FailureKind::AlgorithmFailure => write!(f, "algorithm_failure"),
            FailureKind::PersistenceConflict => write!(f, "persistence_conflict"),
            FailureKind::Internal => write!(f, "internal"),
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a persistence conflict error
    pub fn persistence_conflict(label_column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PersistenceConflict {
            label_column: label_column.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Classify this error for the per-tier summary
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::InsufficientPopulation { .. } => FailureKind::IneligiblePopulation,
            Error::DegeneratePreprocessing { .. } | Error::InvalidFeatureValue { .. } => {
                FailureKind::DegeneratePreprocessing
            }
            Error::NonConvergence { .. } | Error::InvalidInput(_) => FailureKind::AlgorithmFailure,
            Error::PersistenceConflict { .. } => FailureKind::PersistenceConflict,
            Error::Config(_)
            | Error::Database(_)
            | Error::Io(_)
            | Error::Csv(_)
            | Error::Json(_)
            | Error::Toml(_)
            | Error::Internal(_) => FailureKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_mapping() {
        let err = Error::InsufficientPopulation { rows: 2, k: 3, required: 3 };
        assert_eq!(err.failure_kind(), FailureKind::IneligiblePopulation);

        let err = Error::DegeneratePreprocessing { feature: FeatureId::Density };
        assert_eq!(err.failure_kind(), FailureKind::DegeneratePreprocessing);
        assert!(err.to_string().contains("density"));

        let err = Error::NonConvergence { iterations: 300 };
        assert_eq!(err.failure_kind(), FailureKind::AlgorithmFailure);

        let err = Error::persistence_conflict("cluster_s1", "FOREIGN KEY constraint failed");
        assert_eq!(err.failure_kind(), FailureKind::PersistenceConflict);
        assert_eq!(err.failure_kind().to_string(), "persistence_conflict");
    }
}
