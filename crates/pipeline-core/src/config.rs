//! Pipeline configuration document
//!
//! The YAML document under `config/config.yaml` is read once per stage and
//! handed to each component as an immutable value. Environment variables
//! prefixed with `PIPELINE__` override individual keys, e.g.
//! `PIPELINE__DATA_INGESTION__TRAIN_RATIO=0.7`.

use crate::error::{PipelineError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Allowed slack when checking that the split ratios sum to one
const RATIO_TOLERANCE: f64 = 1e-6;

/// Environment prefix for configuration overrides
const ENV_PREFIX: &str = "PIPELINE";

/// Root of the configuration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Ingestion section
    #[serde(default)]
    pub data_ingestion: IngestionConfig,
    /// Preprocessing section
    #[serde(default)]
    pub data_processing: ProcessingConfig,
    /// Training section
    #[serde(default)]
    pub model_training: TrainingConfig,
}

/// Train/test split settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Fraction of rows assigned to the train partition
    pub train_ratio: f64,
    /// Fraction of rows assigned to the test partition
    pub test_ratio: f64,
    /// Seed for the row permutation
    #[serde(default = "default_seed")]
    pub random_seed: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.8,
            test_ratio: 0.2,
            random_seed: default_seed(),
        }
    }
}

/// How a derived column combines its inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivedKind {
    /// Sum of all input columns
    Sum,
    /// First column minus the remaining ones
    Difference,
    /// First column divided by the second (0 when the divisor is 0)
    Ratio,
}

/// An engineered column computed from existing numeric columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedColumn {
    /// Output column name
    pub name: String,
    /// Combination rule
    pub kind: DerivedKind,
    /// Input column names
    pub columns: Vec<String>,
}

/// Feature engineering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Target column (label-encoded like the other categoricals)
    #[serde(default = "default_label_column")]
    pub label_column: String,
    /// Columns encoded as integer class codes
    #[serde(default)]
    pub categorical_columns: Vec<String>,
    /// Columns parsed as numbers and checked for skew
    #[serde(default)]
    pub numerical_columns: Vec<String>,
    /// Identifier columns removed before any transformation
    #[serde(default)]
    pub drop_columns: Vec<String>,
    /// Engineered columns appended after encoding
    #[serde(default)]
    pub derived_columns: Vec<DerivedColumn>,
    /// Columns with skewness above this get a log1p transform
    #[serde(default = "default_skewness_threshold")]
    pub skewness_threshold: f64,
    /// Number of features kept by the selection step
    #[serde(default = "default_no_of_features")]
    pub no_of_features: usize,
    /// Boosting rounds of the model used to rank features
    #[serde(default = "default_selection_estimators")]
    pub selection_estimators: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            label_column: default_label_column(),
            categorical_columns: Vec::new(),
            numerical_columns: Vec::new(),
            drop_columns: Vec::new(),
            derived_columns: Vec::new(),
            skewness_threshold: default_skewness_threshold(),
            no_of_features: default_no_of_features(),
            selection_estimators: default_selection_estimators(),
        }
    }
}

/// Fixed booster hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingParams {
    /// Boosting rounds
    pub n_estimators: usize,
    /// Shrinkage applied to every tree
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Maximum leaves per tree
    pub num_leaves: usize,
    /// Minimum rows in a leaf
    pub min_child_samples: usize,
    /// L2 regularisation on leaf values
    pub lambda_l2: f64,
    /// Row fraction sampled per round
    pub subsample: f64,
    /// Seed for row subsampling
    pub random_seed: u64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            learning_rate: 0.1,
            max_depth: 8,
            num_leaves: 31,
            min_child_samples: 20,
            lambda_l2: 1.0,
            subsample: 1.0,
            random_seed: default_seed(),
        }
    }
}

/// Inclusive integer range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntRange {
    pub low: usize,
    pub high: usize,
}

/// Inclusive float range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatRange {
    pub low: f64,
    pub high: f64,
}

/// Metric maximised by the hyperparameter search
pub use gbdt::Scoring as SearchScoring;

/// Randomized hyperparameter search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of sampled configurations
    pub n_iter: usize,
    /// Cross-validation folds per configuration
    pub cv_folds: usize,
    /// Seed for sampling and fold assignment
    #[serde(default = "default_seed")]
    pub random_seed: u64,
    /// Metric to maximise
    #[serde(default)]
    pub scoring: SearchScoring,
    pub n_estimators: IntRange,
    pub max_depth: IntRange,
    pub learning_rate: FloatRange,
    pub num_leaves: IntRange,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_iter: 4,
            cv_folds: 2,
            random_seed: default_seed(),
            scoring: SearchScoring::Accuracy,
            n_estimators: IntRange { low: 100, high: 500 },
            max_depth: IntRange { low: 5, high: 50 },
            learning_rate: FloatRange {
                low: 0.01,
                high: 0.2,
            },
            num_leaves: IntRange { low: 20, high: 100 },
        }
    }
}

/// Training section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Hyperparameters used when no search is configured
    #[serde(default)]
    pub params: TrainingParams,
    /// Optional randomized search; overrides the searched keys of `params`
    #[serde(default)]
    pub search: Option<SearchConfig>,
}

fn default_seed() -> u64 {
    42
}

fn default_label_column() -> String {
    "booking_status".to_string()
}

fn default_skewness_threshold() -> f64 {
    5.0
}

fn default_no_of_features() -> usize {
    10
}

fn default_selection_estimators() -> usize {
    50
}

impl PipelineConfig {
    /// Load the document from a YAML file, applying environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::NotFound {
                path: path.to_path_buf(),
            });
        }
        info!("Loading configuration from {}", path.display());

        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;

        Self::from_settings(settings)
    }

    /// Parse a YAML document held in memory (no environment overrides)
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        Self::from_settings(settings)
    }

    fn from_settings(settings: Config) -> Result<Self> {
        let config: PipelineConfig = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Check cross-field invariants
    pub fn validate(&self) -> Result<()> {
        self.data_ingestion.validate()?;
        self.data_processing.validate()?;
        if let Some(search) = &self.model_training.search {
            search.validate()?;
        }
        self.model_training.params.validate()
    }
}

impl IngestionConfig {
    /// Ratios must each lie in (0, 1) and sum to one
    pub fn validate(&self) -> Result<()> {
        for (name, ratio) in [("train_ratio", self.train_ratio), ("test_ratio", self.test_ratio)] {
            if !(ratio > 0.0 && ratio < 1.0) {
                return Err(PipelineError::Config(format!(
                    "data_ingestion.{} must be in (0, 1), got {}",
                    name, ratio
                )));
            }
        }
        let total = self.train_ratio + self.test_ratio;
        if (total - 1.0).abs() > RATIO_TOLERANCE {
            return Err(PipelineError::Config(format!(
                "train_ratio + test_ratio must equal 1, got {}",
                total
            )));
        }
        Ok(())
    }
}

impl ProcessingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.no_of_features == 0 {
            return Err(PipelineError::Config(
                "data_processing.no_of_features must be at least 1".to_string(),
            ));
        }
        if self.drop_columns.contains(&self.label_column) {
            return Err(PipelineError::Config(format!(
                "label column '{}' is listed in drop_columns",
                self.label_column
            )));
        }
        for derived in &self.derived_columns {
            let arity_ok = match derived.kind {
                DerivedKind::Ratio => derived.columns.len() == 2,
                DerivedKind::Sum | DerivedKind::Difference => !derived.columns.is_empty(),
            };
            if !arity_ok {
                return Err(PipelineError::Config(format!(
                    "derived column '{}' has {} inputs for kind {:?}",
                    derived.name,
                    derived.columns.len(),
                    derived.kind
                )));
            }
        }
        Ok(())
    }

    /// Columns expected to hold numbers after encoding, label excluded
    pub fn feature_columns(&self) -> Vec<String> {
        self.numerical_columns
            .iter()
            .chain(self.categorical_columns.iter())
            .filter(|c| **c != self.label_column)
            .cloned()
            .collect()
    }
}

impl TrainingParams {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 || self.max_depth == 0 || self.num_leaves < 2 {
            return Err(PipelineError::Config(
                "model_training.params needs n_estimators >= 1, max_depth >= 1, num_leaves >= 2"
                    .to_string(),
            ));
        }
        if !(self.learning_rate > 0.0) || !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(PipelineError::Config(format!(
                "invalid learning_rate {} or subsample {}",
                self.learning_rate, self.subsample
            )));
        }
        Ok(())
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_iter == 0 {
            return Err(PipelineError::Config("search.n_iter must be at least 1".to_string()));
        }
        if self.cv_folds < 2 {
            return Err(PipelineError::Config(format!(
                "search.cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        let int_ranges = [
            ("n_estimators", self.n_estimators),
            ("max_depth", self.max_depth),
            ("num_leaves", self.num_leaves),
        ];
        for (name, range) in int_ranges {
            if range.low > range.high || range.low == 0 {
                return Err(PipelineError::Config(format!(
                    "search.{} range [{}, {}] is empty",
                    name, range.low, range.high
                )));
            }
        }
        if self.num_leaves.low < 2 {
            return Err(PipelineError::Config("search.num_leaves must start at 2".to_string()));
        }
        let lr = self.learning_rate;
        if !(lr.low > 0.0 && lr.low <= lr.high) {
            return Err(PipelineError::Config(format!(
                "search.learning_rate range [{}, {}] is invalid",
                lr.low, lr.high
            )));
        }
        Ok(())
    }
}
