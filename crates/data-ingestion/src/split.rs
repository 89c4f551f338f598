//! Seeded train/test partitioning

use crate::SplitError;
use pipeline_core::{PipelineError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tabular::Table;

const RATIO_TOLERANCE: f64 = 1e-6;

/// Row indices assigned to each partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPlan {
    /// Train rows, in permuted order
    pub train: Vec<usize>,
    /// Test rows, in permuted order
    pub test: Vec<usize>,
}

impl SplitPlan {
    /// Permute `0..n_rows` with `seed`; the first `ceil(test_ratio * n)` go to test
    pub fn new(
        n_rows: usize,
        train_ratio: f64,
        test_ratio: f64,
        seed: u64,
    ) -> std::result::Result<Self, SplitError> {
        check_ratio("train_ratio", train_ratio)?;
        check_ratio("test_ratio", test_ratio)?;
        let total = train_ratio + test_ratio;
        if (total - 1.0).abs() > RATIO_TOLERANCE {
            return Err(SplitError::RatioSum(total));
        }

        // float noise such as 0.3 * 10 = 3.0000000000000004 must not add a row
        let n_test = (test_ratio * n_rows as f64 - RATIO_TOLERANCE).ceil() as usize;
        let n_train = n_rows.saturating_sub(n_test);
        if n_test == 0 || n_train == 0 {
            return Err(SplitError::EmptyPartition {
                rows: n_rows,
                train: n_train,
                test: n_test,
            });
        }

        let mut permutation: Vec<usize> = (0..n_rows).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        permutation.shuffle(&mut rng);

        let train = permutation.split_off(n_test);
        Ok(Self {
            train,
            test: permutation,
        })
    }
}

fn check_ratio(name: &'static str, value: f64) -> std::result::Result<(), SplitError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(SplitError::InvalidRatio { name, value })
    }
}

/// Split a table into (train, test) partitions
pub fn train_test_split(
    data: &Table,
    train_ratio: f64,
    test_ratio: f64,
    seed: u64,
) -> Result<(Table, Table)> {
    let plan = SplitPlan::new(data.n_rows(), train_ratio, test_ratio, seed)
        .map_err(|e| PipelineError::transform("planning train/test split", e))?;

    let train = data
        .select_rows(&plan.train)
        .map_err(|e| PipelineError::transform("selecting train rows", e))?;
    let test = data
        .select_rows(&plan.test)
        .map_err(|e| PipelineError::transform("selecting test rows", e))?;
    Ok((train, test))
}
