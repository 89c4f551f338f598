//! Boosted ensemble for binary classification

use crate::binning::{BinnedMatrix, DEFAULT_MAX_BINS};
use crate::dataset::Dataset;
use crate::metrics::log_loss;
use crate::tree::{Tree, TreeBuilder, TreeLimits};
use crate::GbdtError;
use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Probability clamp used for the prior and the hessian floor
const PROB_EPS: f64 = 1e-15;

/// Rounds between training-loss log lines
const LOG_EVERY: usize = 50;

/// Booster hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtParams {
    /// Boosting rounds
    pub n_estimators: usize,
    /// Shrinkage per tree
    pub learning_rate: f64,
    /// Maximum depth of any tree
    pub max_depth: usize,
    /// Maximum leaves per tree
    pub num_leaves: usize,
    /// Minimum rows per leaf
    pub min_child_samples: usize,
    /// L2 penalty on leaf outputs
    pub lambda_l2: f64,
    /// Fraction of rows sampled each round
    pub subsample: f64,
    /// Histogram resolution
    pub max_bins: usize,
    /// Seed for row subsampling
    pub seed: u64,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 8,
            num_leaves: 31,
            min_child_samples: 20,
            lambda_l2: 1.0,
            subsample: 1.0,
            max_bins: DEFAULT_MAX_BINS,
            seed: 42,
        }
    }
}

impl GbdtParams {
    pub fn validate(&self) -> Result<(), GbdtError> {
        if self.n_estimators == 0 {
            return Err(GbdtError::InvalidParams("n_estimators must be >= 1".to_string()));
        }
        if self.max_depth == 0 || self.num_leaves < 2 {
            return Err(GbdtError::InvalidParams(format!(
                "max_depth={} num_leaves={} cannot grow a tree",
                self.max_depth, self.num_leaves
            )));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(GbdtError::InvalidParams(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(GbdtError::InvalidParams(format!(
                "subsample must be in (0, 1], got {}",
                self.subsample
            )));
        }
        if self.lambda_l2 < 0.0 || self.max_bins < 2 {
            return Err(GbdtError::InvalidParams(
                "lambda_l2 must be >= 0 and max_bins >= 2".to_string(),
            ));
        }
        Ok(())
    }

    fn limits(&self) -> TreeLimits {
        TreeLimits {
            max_depth: self.max_depth,
            num_leaves: self.num_leaves,
            min_child_samples: self.min_child_samples,
            lambda_l2: self.lambda_l2,
            learning_rate: self.learning_rate,
        }
    }
}

/// Fitted classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtClassifier {
    /// Parameters used for fitting
    params: GbdtParams,
    /// Prior log-odds added to every prediction
    base_score: f64,
    /// Trees in boosting order
    trees: Vec<Tree>,
    /// Feature columns expected at prediction time
    feature_names: Vec<String>,
    /// Total split gain per feature
    gain_importance: Vec<f64>,
    /// Split count per feature
    split_counts: Vec<usize>,
}

impl GbdtClassifier {
    /// Fit on a dataset
    pub fn fit(dataset: &Dataset, params: &GbdtParams) -> Result<Self, GbdtError> {
        params.validate()?;
        let n_rows = dataset.n_rows();
        let n_features = dataset.n_features();
        info!(
            "Fitting GBDT: rows={}, features={}, n_estimators={}, learning_rate={}, num_leaves={}, max_depth={}",
            n_rows, n_features, params.n_estimators, params.learning_rate, params.num_leaves, params.max_depth
        );

        let binned = BinnedMatrix::from_dataset(dataset, params.max_bins);
        let labels = dataset.labels();
        let prior = dataset.positive_rate().clamp(PROB_EPS, 1.0 - PROB_EPS);
        let base_score = (prior / (1.0 - prior)).ln();

        let mut raw = vec![base_score; n_rows];
        let mut grads = vec![0.0; n_rows];
        let mut hess = vec![0.0; n_rows];
        let mut trees = Vec::with_capacity(params.n_estimators);
        let mut gain_importance = vec![0.0; n_features];
        let mut split_counts = vec![0usize; n_features];
        let mut rng = StdRng::seed_from_u64(params.seed);

        for round in 0..params.n_estimators {
            for i in 0..n_rows {
                let p = sigmoid(raw[i]);
                grads[i] = p - labels[i];
                hess[i] = (p * (1.0 - p)).max(PROB_EPS);
            }

            let rows: Vec<usize> = if params.subsample < 1.0 {
                (0..n_rows)
                    .filter(|_| rng.random::<f64>() < params.subsample)
                    .collect()
            } else {
                (0..n_rows).collect()
            };
            if rows.is_empty() {
                continue;
            }

            let (tree, splits) = TreeBuilder::new(&binned, &grads, &hess, params.limits()).build(rows);
            for (feature, gain) in splits {
                gain_importance[feature] += gain;
                split_counts[feature] += 1;
            }
            for (i, score) in raw.iter_mut().enumerate() {
                *score += tree.predict_binned(&binned, i);
            }
            trees.push(tree);

            if (round + 1) % LOG_EVERY == 0 {
                let probs: Vec<f64> = raw.iter().map(|&r| sigmoid(r)).collect();
                debug!(
                    "Round {}: train logloss={:.5}",
                    round + 1,
                    log_loss(labels.as_slice().unwrap_or(&[]), &probs)
                );
            }
        }

        info!("GBDT fitted with {} trees", trees.len());
        Ok(Self {
            params: params.clone(),
            base_score,
            trees,
            feature_names: dataset.feature_names().to_vec(),
            gain_importance,
            split_counts,
        })
    }

    /// Raw log-odds per row
    pub fn predict_raw(&self, features: ArrayView2<'_, f64>) -> Result<Vec<f64>, GbdtError> {
        if features.ncols() != self.feature_names.len() {
            return Err(GbdtError::ShapeMismatch {
                what: "feature columns",
                expected: self.feature_names.len(),
                actual: features.ncols(),
            });
        }
        Ok(features
            .rows()
            .into_iter()
            .map(|row| self.base_score + self.trees.iter().map(|t| t.predict(row)).sum::<f64>())
            .collect())
    }

    /// Probability of class 1 per row
    pub fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Result<Vec<f64>, GbdtError> {
        Ok(self.predict_raw(features)?.into_iter().map(sigmoid).collect())
    }

    /// Predicted class (0.0 or 1.0) per row
    pub fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<f64>, GbdtError> {
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| if p >= 0.5 { 1.0 } else { 0.0 })
            .collect())
    }

    /// Gain importance per feature, normalized to sum to one, highest first
    ///
    /// Ties keep column order. All zeros when no split was made.
    pub fn feature_importances(&self) -> Vec<(String, f64)> {
        let total: f64 = self.gain_importance.iter().sum();
        let mut ranked: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .zip(&self.gain_importance)
            .map(|(name, &gain)| (name.clone(), if total > 0.0 { gain / total } else { 0.0 }))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Number of splits made on each feature, in column order
    pub fn split_counts(&self) -> Vec<(String, usize)> {
        self.feature_names
            .iter()
            .cloned()
            .zip(self.split_counts.iter().copied())
            .collect()
    }

    /// Encode as compact bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, GbdtError> {
        postcard::to_allocvec(self).map_err(|e| GbdtError::Serialization(e.to_string()))
    }

    /// Decode bytes produced by [`GbdtClassifier::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GbdtError> {
        let model: Self =
            postcard::from_bytes(bytes).map_err(|e| GbdtError::Serialization(e.to_string()))?;
        model.params.validate()?;
        Ok(model)
    }

    pub fn params(&self) -> &GbdtParams {
        &self.params
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ClassificationReport;
    use ndarray::Array2;

    /// Label is 1 when x0 + noise-free interaction exceeds a threshold; x2 is noise
    fn synthetic(n: usize) -> Dataset {
        let features = Array2::from_shape_fn((n, 3), |(r, c)| match c {
            0 => (r % 50) as f64,
            1 => ((r * 7) % 13) as f64,
            _ => ((r * 31) % 97) as f64,
        });
        let labels: Vec<f64> = (0..n)
            .map(|r| if (r % 50) as f64 + ((r * 7) % 13) as f64 * 0.5 > 30.0 { 1.0 } else { 0.0 })
            .collect();
        Dataset::new(features, labels.into(), vec!["x0".into(), "x1".into(), "noise".into()]).unwrap()
    }

    fn small_params() -> GbdtParams {
        GbdtParams {
            n_estimators: 40,
            num_leaves: 8,
            max_depth: 4,
            min_child_samples: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_fit_learns_threshold_rule() {
        let ds = synthetic(600);
        let model = GbdtClassifier::fit(&ds, &small_params()).unwrap();
        let preds = model.predict(ds.features()).unwrap();

        let report = ClassificationReport::compute(ds.labels().as_slice().unwrap(), &preds).unwrap();
        assert!(report.accuracy > 0.9, "accuracy {}", report.accuracy);
        assert_eq!(model.n_trees(), 40);
    }

    #[test]
    fn test_importance_ranks_signal_above_noise() {
        let ds = synthetic(600);
        let model = GbdtClassifier::fit(&ds, &small_params()).unwrap();
        let ranked = model.feature_importances();

        assert_eq!(ranked[0].0, "x0");
        let total: f64 = ranked.iter().map(|(_, g)| g).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_is_deterministic_with_subsampling() {
        let ds = synthetic(300);
        let params = GbdtParams {
            subsample: 0.7,
            ..small_params()
        };
        let a = GbdtClassifier::fit(&ds, &params).unwrap();
        let b = GbdtClassifier::fit(&ds, &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bytes_round_trip_predictions() {
        let ds = synthetic(200);
        let model = GbdtClassifier::fit(&ds, &small_params()).unwrap();

        let restored = GbdtClassifier::from_bytes(&model.to_bytes().unwrap()).unwrap();
        assert_eq!(
            restored.predict_proba(ds.features()).unwrap(),
            model.predict_proba(ds.features()).unwrap()
        );
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let result = GbdtClassifier::from_bytes(&[0xff, 0x01, 0x02]);
        assert!(matches!(result, Err(GbdtError::Serialization(_))));
    }

    #[test]
    fn test_wrong_width_rejected() {
        let ds = synthetic(100);
        let model = GbdtClassifier::fit(&ds, &small_params()).unwrap();
        let narrow = Array2::<f64>::zeros((2, 2));
        assert!(matches!(
            model.predict(narrow.view()),
            Err(GbdtError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_params() {
        let ds = synthetic(50);
        let params = GbdtParams {
            learning_rate: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            GbdtClassifier::fit(&ds, &params),
            Err(GbdtError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_single_class_predicts_that_class() {
        let features = Array2::from_shape_fn((30, 1), |(r, _)| r as f64);
        let ds = Dataset::new(features, vec![1.0; 30].into(), vec!["x".into()]).unwrap();
        let model = GbdtClassifier::fit(&ds, &small_params()).unwrap();
        assert!(model.predict(ds.features()).unwrap().iter().all(|&p| p == 1.0));
    }
}
