//! Binary classification metrics

use crate::GbdtError;
use serde::{Deserialize, Serialize};

/// Evaluation summary with class 1 as the positive class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
    /// Rows evaluated
    pub support: usize,
}

impl ClassificationReport {
    /// Compare predicted classes with true labels; zero divisions yield 0
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Result<Self, GbdtError> {
        if y_true.len() != y_pred.len() {
            return Err(GbdtError::ShapeMismatch {
                what: "predictions",
                expected: y_true.len(),
                actual: y_pred.len(),
            });
        }
        if y_true.is_empty() {
            return Err(GbdtError::EmptyDataset);
        }

        let (mut tp, mut fp, mut tn, mut fn_) = (0usize, 0usize, 0usize, 0usize);
        for (&truth, &pred) in y_true.iter().zip(y_pred) {
            match (truth == 1.0, pred == 1.0) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (false, false) => tn += 1,
                (true, false) => fn_ += 1,
            }
        }

        let support = y_true.len();
        let accuracy = (tp + tn) as f64 / support as f64;
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Ok(Self {
            accuracy,
            precision,
            recall,
            f1,
            true_positive: tp,
            false_positive: fp,
            true_negative: tn,
            false_negative: fn_,
            support,
        })
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Mean binary cross-entropy of probabilities against labels
pub fn log_loss(y_true: &[f64], probs: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let eps = 1e-15;
    let total: f64 = y_true
        .iter()
        .zip(probs)
        .map(|(&y, &p)| {
            let p = p.clamp(eps, 1.0 - eps);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    total / y_true.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let y_true = [1.0, 1.0, 0.0, 0.0, 1.0];
        let y_pred = [1.0, 0.0, 0.0, 1.0, 1.0];
        let report = ClassificationReport::compute(&y_true, &y_pred).unwrap();

        assert_eq!(report.true_positive, 2);
        assert_eq!(report.false_positive, 1);
        assert_eq!(report.true_negative, 1);
        assert_eq!(report.false_negative, 1);
        assert!((report.accuracy - 0.6).abs() < 1e-12);
        assert!((report.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_positive_predictions() {
        let report = ClassificationReport::compute(&[1.0, 0.0], &[0.0, 0.0]).unwrap();
        assert_eq!(report.precision, 0.0);
        assert_eq!(report.f1, 0.0);
        assert_eq!(report.accuracy, 0.5);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(ClassificationReport::compute(&[1.0], &[1.0, 0.0]).is_err());
        assert!(ClassificationReport::compute(&[], &[]).is_err());
    }

    #[test]
    fn test_log_loss() {
        let perfect = log_loss(&[1.0, 0.0], &[1.0, 0.0]);
        assert!(perfect < 1e-10);
        let coin = log_loss(&[1.0, 0.0], &[0.5, 0.5]);
        assert!((coin - std::f64::consts::LN_2).abs() < 1e-12);
    }
}
