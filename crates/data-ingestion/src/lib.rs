//! Data Ingestion
//!
//! First pipeline stage: copy the source dataset into the artifacts area and
//! partition it into reproducible train and test files.

mod ingestion;
mod split;

pub use ingestion::{DataIngestion, IngestionReport};
pub use split::{train_test_split, SplitPlan};

use thiserror::Error;

/// Errors while partitioning rows
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitError {
    /// Ratio outside (0, 1)
    #[error("{name} must be in (0, 1), got {value}")]
    InvalidRatio { name: &'static str, value: f64 },

    /// Ratios do not add up to one
    #[error("train_ratio + test_ratio must equal 1, got {0}")]
    RatioSum(f64),

    /// Too few rows for both partitions to be non-empty
    #[error("Cannot split {rows} rows into train={train} and test={test}")]
    EmptyPartition {
        rows: usize,
        train: usize,
        test: usize,
    },
}
