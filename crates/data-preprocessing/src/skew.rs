//! Skewness Correction

use crate::FeatureError;
use tabular::NumericTable;
use tracing::{debug, info};

/// Bias-corrected sample skewness (Fisher-Pearson, adjusted)
///
/// Returns 0 for fewer than three values or a constant column.
pub fn skewness(values: &[f64]) -> f64 {
    let count = values.len();
    if count < 3 {
        return 0.0;
    }
    let n = count as f64;
    let mean = values.iter().sum::<f64>() / n;

    let mut m2 = 0.0;
    let mut m3 = 0.0;
    for &v in values {
        let d = v - mean;
        m2 += d * d;
        m3 += d * d * d;
    }
    m2 /= n;
    m3 /= n;

    if m2.sqrt() <= 1e-12 * mean.abs().max(1.0) {
        return 0.0;
    }
    let g1 = m3 / m2.powf(1.5);
    g1 * (n * (n - 1.0)).sqrt() / (n - 2.0)
}

/// Replace every value with `ln(1 + x)`
pub fn log1p_column(column: &str, values: &mut [f64]) -> Result<(), FeatureError> {
    for (row, value) in values.iter_mut().enumerate() {
        if *value <= -1.0 {
            return Err(FeatureError::LogDomain {
                column: column.to_string(),
                row,
                value: *value,
            });
        }
        *value = value.ln_1p();
    }
    Ok(())
}

/// Chooses columns whose train skewness exceeds a threshold
#[derive(Debug, Clone)]
pub struct SkewCorrector {
    threshold: f64,
    /// Columns selected by [`SkewCorrector::fit`]
    columns: Vec<String>,
}

impl SkewCorrector {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            columns: Vec::new(),
        }
    }

    /// Measure each candidate column of `train`
    pub fn fit<S: AsRef<str>>(&mut self, train: &NumericTable, candidates: &[S]) -> Result<&[String], FeatureError> {
        self.columns.clear();
        for name in candidates {
            let name = name.as_ref();
            let values = train
                .column(name)
                .map_err(|_| FeatureError::MissingColumn(name.to_string()))?;
            let skew = skewness(values);
            debug!("Skewness of {}: {:.4}", name, skew);
            if skew > self.threshold {
                self.columns.push(name.to_string());
            }
        }
        info!(
            "{} column(s) exceed skewness threshold {}: {:?}",
            self.columns.len(),
            self.threshold,
            self.columns
        );
        Ok(&self.columns)
    }

    /// Apply `ln(1 + x)` to the fitted columns
    pub fn apply(&self, table: &mut NumericTable) -> Result<(), FeatureError> {
        for name in &self.columns {
            let values = table
                .column_mut(name)
                .map_err(|_| FeatureError::MissingColumn(name.clone()))?;
            log1p_column(name, values)?;
        }
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}
