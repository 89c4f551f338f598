//! Randomized hyperparameter search with k-fold cross-validation

use crate::booster::{GbdtClassifier, GbdtParams};
use crate::dataset::Dataset;
use crate::metrics::ClassificationReport;
use crate::GbdtError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Inclusive ranges sampled uniformly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub n_estimators: (usize, usize),
    pub max_depth: (usize, usize),
    pub num_leaves: (usize, usize),
    pub learning_rate: (f64, f64),
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            n_estimators: (100, 500),
            max_depth: (5, 50),
            num_leaves: (20, 100),
            learning_rate: (0.01, 0.2),
        }
    }
}

impl SearchSpace {
    fn validate(&self) -> Result<(), GbdtError> {
        let ints = [
            ("n_estimators", self.n_estimators),
            ("max_depth", self.max_depth),
            ("num_leaves", self.num_leaves),
        ];
        for (name, (low, high)) in ints {
            if low > high {
                return Err(GbdtError::InvalidParams(format!("{} range [{}, {}] is empty", name, low, high)));
            }
        }
        let (low, high) = self.learning_rate;
        if !(low > 0.0 && low <= high) {
            return Err(GbdtError::InvalidParams(format!(
                "learning_rate range [{}, {}] is invalid",
                low, high
            )));
        }
        Ok(())
    }

    /// Draw one configuration on top of `base`
    pub fn sample<R: Rng>(&self, base: &GbdtParams, rng: &mut R) -> GbdtParams {
        let (lr_low, lr_high) = self.learning_rate;
        GbdtParams {
            n_estimators: rng.random_range(self.n_estimators.0..=self.n_estimators.1),
            max_depth: rng.random_range(self.max_depth.0..=self.max_depth.1),
            num_leaves: rng.random_range(self.num_leaves.0..=self.num_leaves.1),
            learning_rate: if lr_low < lr_high {
                rng.random_range(lr_low..=lr_high)
            } else {
                lr_low
            },
            ..base.clone()
        }
    }
}

/// Metric to maximise; spelled `accuracy` or `f1` in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scoring {
    #[default]
    Accuracy,
    F1,
}

impl Scoring {
    fn pick(&self, report: &ClassificationReport) -> f64 {
        match self {
            Scoring::Accuracy => report.accuracy,
            Scoring::F1 => report.f1,
        }
    }
}

/// One evaluated configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub params: GbdtParams,
    /// Mean score across folds
    pub score: f64,
}

/// Search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub best_params: GbdtParams,
    pub best_score: f64,
    pub trials: Vec<TrialResult>,
}

/// Random search over a [`SearchSpace`]
#[derive(Debug, Clone)]
pub struct RandomSearch {
    space: SearchSpace,
    n_iter: usize,
    cv_folds: usize,
    seed: u64,
    scoring: Scoring,
}

impl RandomSearch {
    pub fn new(space: SearchSpace, n_iter: usize, cv_folds: usize, seed: u64) -> Self {
        Self {
            space,
            n_iter,
            cv_folds,
            seed,
            scoring: Scoring::default(),
        }
    }

    pub fn with_scoring(mut self, scoring: Scoring) -> Self {
        self.scoring = scoring;
        self
    }

    /// Evaluate `n_iter` sampled configurations and return the best
    pub fn run(&self, dataset: &Dataset, base: &GbdtParams) -> Result<SearchOutcome, GbdtError> {
        self.space.validate()?;
        if self.n_iter == 0 {
            return Err(GbdtError::InvalidParams("n_iter must be >= 1".to_string()));
        }
        if self.cv_folds < 2 || dataset.n_rows() < self.cv_folds {
            return Err(GbdtError::InvalidParams(format!(
                "cannot run {}-fold cross-validation on {} rows",
                self.cv_folds,
                dataset.n_rows()
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let folds = self.fold_assignment(dataset.n_rows(), &mut rng);

        info!(
            "Starting random search: n_iter={}, cv_folds={}, scoring={:?}",
            self.n_iter, self.cv_folds, self.scoring
        );

        let mut trials = Vec::with_capacity(self.n_iter);
        for trial in 0..self.n_iter {
            let params = self.space.sample(base, &mut rng);
            let score = self.cross_validate(dataset, &params, &folds)?;
            info!(
                "Trial {}/{}: n_estimators={}, max_depth={}, num_leaves={}, learning_rate={:.4} -> {:.4}",
                trial + 1,
                self.n_iter,
                params.n_estimators,
                params.max_depth,
                params.num_leaves,
                params.learning_rate,
                score
            );
            trials.push(TrialResult { params, score });
        }

        // first trial wins ties
        let best = trials
            .iter()
            .fold(None, |acc: Option<&TrialResult>, t| match acc {
                Some(b) if b.score >= t.score => Some(b),
                _ => Some(t),
            })
            .ok_or(GbdtError::EmptyDataset)?;

        info!("Best score {:.4} with {:?}", best.score, best.params);
        Ok(SearchOutcome {
            best_params: best.params.clone(),
            best_score: best.score,
            trials: trials.clone(),
        })
    }

    /// Shuffled fold id per row; fold sizes differ by at most one
    fn fold_assignment(&self, n_rows: usize, rng: &mut StdRng) -> Vec<usize> {
        let mut order: Vec<usize> = (0..n_rows).collect();
        order.shuffle(rng);
        let mut folds = vec![0; n_rows];
        for (position, &row) in order.iter().enumerate() {
            folds[row] = position % self.cv_folds;
        }
        folds
    }

    fn cross_validate(&self, dataset: &Dataset, params: &GbdtParams, folds: &[usize]) -> Result<f64, GbdtError> {
        let mut total = 0.0;
        for fold in 0..self.cv_folds {
            let (valid, train): (Vec<usize>, Vec<usize>) =
                (0..dataset.n_rows()).partition(|&r| folds[r] == fold);

            let model = GbdtClassifier::fit(&dataset.subset(&train)?, params)?;
            let holdout = dataset.subset(&valid)?;
            let preds = model.predict(holdout.features())?;
            let labels = holdout.labels().to_vec();
            total += self.scoring.pick(&ClassificationReport::compute(&labels, &preds)?);
        }
        Ok(total / self.cv_folds as f64)
    }
}
