//! Quantile binning of feature columns

use crate::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// Upper limit on bins per feature (bin ids fit in a byte)
pub const DEFAULT_MAX_BINS: usize = 255;

/// Maps raw feature values to bin ids
///
/// Bin `b` holds values in `(upper_bounds[b - 1], upper_bounds[b]]`; the last
/// bound is `+inf`, so every finite value has a bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinMapper {
    upper_bounds: Vec<f64>,
}

impl BinMapper {
    /// Derive bin bounds from observed values
    ///
    /// With at most `max_bins` distinct values every value gets its own bin
    /// (bounds at midpoints); otherwise bounds sit on evenly spaced quantiles.
    pub fn fit(values: &[f64], max_bins: usize) -> Self {
        let max_bins = max_bins.clamp(2, DEFAULT_MAX_BINS);
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);

        let mut distinct = sorted.clone();
        distinct.dedup();

        let mut upper_bounds = if distinct.len() <= max_bins {
            distinct
                .windows(2)
                .map(|pair| pair[0] + (pair[1] - pair[0]) / 2.0)
                .collect::<Vec<_>>()
        } else {
            let n = sorted.len();
            let mut cuts: Vec<f64> = (1..max_bins).map(|k| sorted[k * n / max_bins - 1]).collect();
            cuts.dedup();
            // the maximum value must stay in the final bin
            if let Some(&last) = sorted.last() {
                cuts.retain(|&c| c < last);
            }
            cuts
        };
        upper_bounds.push(f64::INFINITY);

        Self { upper_bounds }
    }

    /// Bin id for a value
    pub fn bin(&self, value: f64) -> u8 {
        self.upper_bounds.partition_point(|&bound| bound < value) as u8
    }

    pub fn n_bins(&self) -> usize {
        self.upper_bounds.len()
    }

    /// Raw threshold equivalent to "bin <= `bin`"
    pub fn threshold(&self, bin: usize) -> f64 {
        self.upper_bounds[bin]
    }
}

/// Column-major bin ids for a whole dataset
#[derive(Debug, Clone)]
pub struct BinnedMatrix {
    /// One mapper per feature
    mappers: Vec<BinMapper>,
    /// `bins[feature][row]`
    bins: Vec<Vec<u8>>,
    n_rows: usize,
}

impl BinnedMatrix {
    /// Fit mappers on the dataset and bin every value
    pub fn from_dataset(dataset: &Dataset, max_bins: usize) -> Self {
        let features = dataset.features();
        let mut mappers = Vec::with_capacity(dataset.n_features());
        let mut bins = Vec::with_capacity(dataset.n_features());

        for column in features.columns() {
            let values: Vec<f64> = column.iter().copied().collect();
            let mapper = BinMapper::fit(&values, max_bins);
            bins.push(values.iter().map(|&v| mapper.bin(v)).collect());
            mappers.push(mapper);
        }

        Self {
            mappers,
            bins,
            n_rows: dataset.n_rows(),
        }
    }

    pub fn mapper(&self, feature: usize) -> &BinMapper {
        &self.mappers[feature]
    }

    /// Bin ids of one feature across all rows
    pub fn feature_bins(&self, feature: usize) -> &[u8] {
        &self.bins[feature]
    }

    pub fn bin(&self, row: usize, feature: usize) -> u8 {
        self.bins[feature][row]
    }

    pub fn n_features(&self) -> usize {
        self.mappers.len()
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_few_distinct_values_get_own_bins() {
        let mapper = BinMapper::fit(&[3.0, 1.0, 2.0, 2.0, 1.0], 255);

        assert_eq!(mapper.n_bins(), 3);
        assert_eq!(mapper.bin(1.0), 0);
        assert_eq!(mapper.bin(2.0), 1);
        assert_eq!(mapper.bin(3.0), 2);
        assert_eq!(mapper.threshold(0), 1.5);
    }

    #[test]
    fn test_threshold_consistent_with_bins() {
        let values: Vec<f64> = (0..1000).map(|i| (i as f64).sqrt()).collect();
        let mapper = BinMapper::fit(&values, 16);
        assert!(mapper.n_bins() <= 16);

        for &v in &values {
            let b = mapper.bin(v) as usize;
            assert!(v <= mapper.threshold(b));
            if b > 0 {
                assert!(v > mapper.threshold(b - 1));
            }
        }
    }

    #[test]
    fn test_constant_column_single_bin() {
        let mapper = BinMapper::fit(&[7.0; 20], 255);
        assert_eq!(mapper.n_bins(), 1);
        assert_eq!(mapper.bin(7.0), 0);
        assert_eq!(mapper.bin(-100.0), 0);
    }

    #[test]
    fn test_unseen_values_route_to_edges() {
        let mapper = BinMapper::fit(&[1.0, 2.0, 3.0], 255);
        assert_eq!(mapper.bin(-5.0), 0);
        assert_eq!(mapper.bin(1e9) as usize, mapper.n_bins() - 1);
    }

    proptest! {
        #[test]
        fn test_bins_are_monotonic(
            values in prop::collection::vec(-1e6f64..1e6, 1..400),
            max_bins in 2usize..64,
        ) {
            let mapper = BinMapper::fit(&values, max_bins);
            prop_assert!(mapper.n_bins() <= max_bins);

            let mut sorted = values.clone();
            sorted.sort_by(f64::total_cmp);
            for pair in sorted.windows(2) {
                prop_assert!(mapper.bin(pair[0]) <= mapper.bin(pair[1]));
            }
        }
    }
}
