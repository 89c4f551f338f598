//! Data Preprocessing Stage
//!
//! Turns the raw train/test partitions into numeric feature tables. Every
//! transformation is fitted on the train partition and replayed on test.

mod derived;
mod encoder;
mod processor;
mod selection;
mod skew;

pub use derived::compute_derived;
pub use encoder::LabelEncoder;
pub use processor::{DataProcessor, ProcessingReport};
pub use selection::FeatureSelector;
pub use skew::{log1p_column, skewness, SkewCorrector};

use thiserror::Error;

/// Feature transformation errors
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Configured column absent from the input
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Derived column has the wrong number of inputs
    #[error("Derived column {column} has {inputs} input(s)")]
    Arity { column: String, inputs: usize },

    /// Test partition holds a label value never seen in train
    #[error("Column {column}: label value '{value}' not seen during fit")]
    UnseenLabel { column: String, value: String },

    /// Label column does not describe a binary target
    #[error("Label column {column} has {classes} classes; expected at most 2")]
    NotBinary { column: String, classes: usize },

    /// Reading or reshaping a column failed
    #[error(transparent)]
    Table(#[from] tabular::TableError),

    /// log1p undefined for the value
    #[error("Column {column} row {row}: cannot apply ln(1 + x) to {value}")]
    LogDomain { column: String, row: usize, value: f64 },
}
