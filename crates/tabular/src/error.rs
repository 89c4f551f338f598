//! Table Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading, writing, or reshaping tables
#[derive(Debug, Error)]
pub enum TableError {
    /// Input file does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Filesystem failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed CSV content
    #[error("CSV error in {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    /// Column is not part of the header
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Column name appears twice
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// Cell could not be parsed as a finite number
    #[error("Column {column} row {row}: '{value}' is not a finite number")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },

    /// Column length does not match the table
    #[error("Column {column} has {actual} values, table has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Row index past the end of the table
    #[error("Row index {index} out of bounds for {rows} rows")]
    RowOutOfBounds { index: usize, rows: usize },
}
