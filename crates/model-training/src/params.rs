//! Configuration to booster parameter mapping

use gbdt::{GbdtParams, RandomSearch, SearchSpace};
use pipeline_core::{SearchConfig, TrainingParams};

/// Booster parameters for the configured fixed hyperparameters
pub fn booster_params(params: &TrainingParams) -> GbdtParams {
    GbdtParams {
        n_estimators: params.n_estimators,
        learning_rate: params.learning_rate,
        max_depth: params.max_depth,
        num_leaves: params.num_leaves,
        min_child_samples: params.min_child_samples,
        lambda_l2: params.lambda_l2,
        subsample: params.subsample,
        seed: params.random_seed,
        ..Default::default()
    }
}

/// Sampling ranges of a search block
pub fn search_space(search: &SearchConfig) -> SearchSpace {
    SearchSpace {
        n_estimators: (search.n_estimators.low, search.n_estimators.high),
        max_depth: (search.max_depth.low, search.max_depth.high),
        num_leaves: (search.num_leaves.low, search.num_leaves.high),
        learning_rate: (search.learning_rate.low, search.learning_rate.high),
    }
}

pub(crate) fn random_search(search: &SearchConfig) -> RandomSearch {
    RandomSearch::new(search_space(search), search.n_iter, search.cv_folds, search.random_seed)
        .with_scoring(search.scoring)
}
