//! Importance-based feature selection

use gbdt::{Dataset, GbdtClassifier, GbdtError, GbdtParams};
use tabular::NumericTable;
use tracing::info;

/// Keeps the features a small booster finds most useful
#[derive(Debug, Clone)]
pub struct FeatureSelector {
    /// Features to keep
    no_of_features: usize,
    /// Boosting parameters of the ranking model
    params: GbdtParams,
}

impl FeatureSelector {
    pub fn new(no_of_features: usize, n_estimators: usize, seed: u64) -> Self {
        Self {
            no_of_features,
            params: GbdtParams {
                n_estimators,
                seed,
                ..Default::default()
            },
        }
    }

    /// Rank `features` of `table` against `labels`; returns the kept names
    /// in rank order
    pub fn select<S: AsRef<str>>(
        &self,
        table: &NumericTable,
        features: &[S],
        labels: &[f64],
    ) -> Result<Vec<String>, GbdtError> {
        let names: Vec<String> = features.iter().map(|f| f.as_ref().to_string()).collect();
        let columns = names
            .iter()
            .map(|name| {
                table.column(name).map(<[f64]>::to_vec).map_err(|_| {
                    GbdtError::InvalidParams(format!("feature column {} is missing", name))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let dataset = Dataset::from_columns(names, &columns, labels.to_vec())?;

        let model = GbdtClassifier::fit(&dataset, &self.params)?;
        let ranked = model.feature_importances();
        for (rank, (name, importance)) in ranked.iter().enumerate() {
            info!("Feature rank {}: {} ({:.4})", rank + 1, name, importance);
        }

        let keep: Vec<String> = ranked
            .into_iter()
            .take(self.no_of_features)
            .map(|(name, _)| name)
            .collect();
        info!("Selected {} of {} features", keep.len(), features.len());
        Ok(keep)
    }
}
