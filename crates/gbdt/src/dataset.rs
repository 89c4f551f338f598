//! Feature matrix with binary labels

use crate::GbdtError;
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Validated training or evaluation data
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Row-major features, one row per sample
    features: Array2<f64>,
    /// 0.0 or 1.0 per row
    labels: Array1<f64>,
    /// Column names, one per feature
    feature_names: Vec<String>,
}

impl Dataset {
    /// Build a dataset, rejecting empty input, bad labels, and non-finite values
    pub fn new(
        features: Array2<f64>,
        labels: Array1<f64>,
        feature_names: Vec<String>,
    ) -> Result<Self, GbdtError> {
        let (n_rows, n_cols) = features.dim();
        if n_rows == 0 || n_cols == 0 {
            return Err(GbdtError::EmptyDataset);
        }
        if labels.len() != n_rows {
            return Err(GbdtError::ShapeMismatch {
                what: "labels",
                expected: n_rows,
                actual: labels.len(),
            });
        }
        if feature_names.len() != n_cols {
            return Err(GbdtError::ShapeMismatch {
                what: "feature names",
                expected: n_cols,
                actual: feature_names.len(),
            });
        }
        for (row, &value) in labels.iter().enumerate() {
            if value != 0.0 && value != 1.0 {
                return Err(GbdtError::InvalidLabel { row, value });
            }
        }
        for ((row, feature), value) in features.indexed_iter() {
            if !value.is_finite() {
                return Err(GbdtError::NonFiniteFeature { row, feature });
            }
        }

        Ok(Self {
            features,
            labels,
            feature_names,
        })
    }

    /// Build from column vectors
    pub fn from_columns(
        feature_names: Vec<String>,
        columns: &[Vec<f64>],
        labels: Vec<f64>,
    ) -> Result<Self, GbdtError> {
        let n_rows = labels.len();
        for column in columns {
            if column.len() != n_rows {
                return Err(GbdtError::ShapeMismatch {
                    what: "feature column",
                    expected: n_rows,
                    actual: column.len(),
                });
            }
        }
        let features = Array2::from_shape_fn((n_rows, columns.len()), |(r, c)| columns[c][r]);
        Self::new(features, Array1::from(labels), feature_names)
    }

    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    pub fn labels(&self) -> &Array1<f64> {
        &self.labels
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Fraction of rows labelled 1
    pub fn positive_rate(&self) -> f64 {
        self.labels.sum() / self.labels.len() as f64
    }

    /// Copy of the given rows, in the given order
    pub fn subset(&self, rows: &[usize]) -> Result<Dataset, GbdtError> {
        if rows.is_empty() {
            return Err(GbdtError::EmptyDataset);
        }
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.n_rows()) {
            return Err(GbdtError::ShapeMismatch {
                what: "row index",
                expected: self.n_rows(),
                actual: bad,
            });
        }
        Ok(Self {
            features: self.features.select(Axis(0), rows),
            labels: self.labels.select(Axis(0), rows),
            feature_names: self.feature_names.clone(),
        })
    }
}
