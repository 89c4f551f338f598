//! Gradient-Boosted Decision Trees
//!
//! Binary classifier trained with second-order boosting on the logistic
//! loss. Features are bucketed into quantile bins once per fit; trees grow
//! leaf-wise, always splitting the leaf with the largest gain.

mod binning;
mod booster;
mod dataset;
mod metrics;
mod search;
mod tree;

pub use binning::{BinMapper, BinnedMatrix, DEFAULT_MAX_BINS};
pub use booster::{GbdtClassifier, GbdtParams};
pub use dataset::Dataset;
pub use metrics::{log_loss, ClassificationReport};
pub use search::{RandomSearch, Scoring, SearchOutcome, SearchSpace, TrialResult};
pub use tree::{Node, Tree};

use thiserror::Error;

/// Errors while building datasets, fitting, or predicting
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GbdtError {
    /// No rows to fit or score
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Dimensions disagree
    #[error("Shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Label other than 0 or 1
    #[error("Row {row} has label {value}; expected 0 or 1")]
    InvalidLabel { row: usize, value: f64 },

    /// NaN or infinite feature value
    #[error("Row {row} feature {feature} is not finite")]
    NonFiniteFeature { row: usize, feature: usize },

    /// Hyperparameters out of range
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Model bytes could not be encoded or decoded
    #[error("Serialization failed: {0}")]
    Serialization(String),
}
