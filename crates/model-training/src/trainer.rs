//! Model Training

use crate::evaluation::EvaluationMetrics;
use crate::params::{booster_params, random_search};
use chrono::Utc;
use gbdt::{log_loss, ClassificationReport, Dataset, GbdtClassifier};
use pipeline_core::{PipelineConfig, PipelineError, ProjectPaths, Result, TrainingConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tabular::{AtomicWriter, NumericTable, Table, TableError};
use tracing::{error, info};

/// A fitted classifier and, when searched, its cross-validated score
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub model: GbdtClassifier,
    pub cv_score: Option<f64>,
}

/// Outcome of a successful training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub metrics: EvaluationMetrics,
    pub model_path: PathBuf,
    pub metrics_path: PathBuf,
}

/// Trains on the processed partitions and publishes the artifact
pub struct ModelTraining {
    train_path: PathBuf,
    test_path: PathBuf,
    model_output_path: PathBuf,
    label_column: String,
    config: TrainingConfig,
}

impl ModelTraining {
    pub fn new(
        train_path: impl Into<PathBuf>,
        test_path: impl Into<PathBuf>,
        model_output_path: impl Into<PathBuf>,
        config: &PipelineConfig,
    ) -> Self {
        let trainer = Self {
            train_path: train_path.into(),
            test_path: test_path.into(),
            model_output_path: model_output_path.into(),
            label_column: config.data_processing.label_column.clone(),
            config: config.model_training.clone(),
        };
        info!("Model Training initialized");
        info!("Model output path: {}", trainer.model_output_path.display());
        trainer
    }

    /// Read both processed files; returns (train, test)
    pub fn load_and_split_data(&self) -> Result<(Dataset, Dataset)> {
        info!("Loading data from {}", self.train_path.display());
        let train = load_numeric(&self.train_path)?;
        info!("Loading data from {}", self.test_path.display());
        let test = load_numeric(&self.test_path)?;

        if train.names() != test.names() {
            return Err(PipelineError::transform(
                "processed train and test columns differ",
                format!("train {:?} vs test {:?}", train.names(), test.names()),
            ));
        }

        let train = self.to_dataset(&train)?;
        let test = self.to_dataset(&test)?;
        info!(
            "Data split: {} train rows, {} test rows, {} features",
            train.n_rows(),
            test.n_rows(),
            train.n_features()
        );
        Ok((train, test))
    }

    /// Fit with the fixed parameters, or with the best searched ones
    pub fn train(&self, train: &Dataset) -> Result<FittedModel> {
        let base = booster_params(&self.config.params);

        let (params, cv_score) = match &self.config.search {
            Some(search) => {
                info!("Running randomized hyperparameter search");
                let outcome = random_search(search)
                    .run(train, &base)
                    .map_err(|e| PipelineError::fit("hyperparameter search", e))?;
                info!("Best parameters: {:?}", outcome.best_params);
                info!("Best cross-validated score: {:.4}", outcome.best_score);
                (outcome.best_params, Some(outcome.best_score))
            }
            None => (base, None),
        };

        info!("Training model");
        let model = GbdtClassifier::fit(train, &params).map_err(|e| PipelineError::fit("fitting classifier", e))?;
        info!("Model trained with {} trees", model.n_trees());
        Ok(FittedModel { model, cv_score })
    }

    /// Score the model on the test partition
    pub fn evaluate(&self, fitted: &FittedModel, test: &Dataset) -> Result<EvaluationMetrics> {
        info!("Evaluating model");
        let features = test.features();
        let probs = fitted
            .model
            .predict_proba(features)
            .map_err(|e| PipelineError::fit("predicting test partition", e))?;
        let preds = fitted
            .model
            .predict(features)
            .map_err(|e| PipelineError::fit("predicting test partition", e))?;
        let labels = test.labels().to_vec();
        let report =
            ClassificationReport::compute(&labels, &preds).map_err(|e| PipelineError::fit("scoring predictions", e))?;

        let metrics = EvaluationMetrics {
            accuracy: report.accuracy,
            precision: report.precision,
            recall: report.recall,
            f1: report.f1,
            log_loss: log_loss(&labels, &probs),
            report,
            params: fitted.model.params().clone(),
            cv_score: fitted.cv_score,
            feature_importances: fitted.model.feature_importances(),
            evaluated_at: Utc::now(),
        };

        info!("Accuracy Score: {:.4}", metrics.accuracy);
        info!("Precision Score: {:.4}", metrics.precision);
        info!("Recall Score: {:.4}", metrics.recall);
        info!("F1 Score: {:.4}", metrics.f1);
        info!("Log loss: {:.4}", metrics.log_loss);
        Ok(metrics)
    }

    /// Publish the model and its metrics together; returns (model, metrics) paths
    pub fn save_model(&self, fitted: &FittedModel, metrics: &EvaluationMetrics) -> Result<(PathBuf, PathBuf)> {
        let bytes = fitted
            .model
            .to_bytes()
            .map_err(|e| PipelineError::fit("serializing model", e))?;
        let json = metrics
            .to_json()
            .map_err(|e| PipelineError::io("serializing metrics", e))?;
        let metrics_path = ProjectPaths::metrics_for_model(&self.model_output_path);

        let mut writer = AtomicWriter::new();
        writer
            .stage_bytes(&bytes, &self.model_output_path)
            .map_err(|e| PipelineError::io("writing model artifact", e))?;
        writer
            .stage_bytes(json.as_bytes(), &metrics_path)
            .map_err(|e| PipelineError::io("writing metrics", e))?;
        writer
            .commit()
            .map_err(|e| PipelineError::io("publishing model artifact", e))?;

        info!("Model saved to {} ({} bytes)", self.model_output_path.display(), bytes.len());
        info!("Metrics saved to {}", metrics_path.display());
        Ok((self.model_output_path.clone(), metrics_path))
    }

    /// Load, train, evaluate, and save
    pub fn run(&self) -> Result<TrainingReport> {
        self.try_run().map_err(|e| {
            error!("Error in model training pipeline ({}): {}", e.kind(), e);
            e
        })
    }

    fn try_run(&self) -> Result<TrainingReport> {
        info!("Starting model training pipeline");
        let (train, test) = self.load_and_split_data()?;
        let fitted = self.train(&train)?;
        let metrics = self.evaluate(&fitted, &test)?;
        let (model_path, metrics_path) = self.save_model(&fitted, &metrics)?;
        info!("Model training completed successfully");

        Ok(TrainingReport {
            train_rows: train.n_rows(),
            test_rows: test.n_rows(),
            metrics,
            model_path,
            metrics_path,
        })
    }

    fn to_dataset(&self, table: &NumericTable) -> Result<Dataset> {
        let label = self.label_column.as_str();
        let labels = table
            .column(label)
            .map_err(|e| PipelineError::transform("reading label column", e))?
            .to_vec();
        let names: Vec<String> = table.names().iter().filter(|n| *n != label).cloned().collect();
        let columns = names
            .iter()
            .map(|n| table.column(n).map(<[f64]>::to_vec))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| PipelineError::transform("reading feature columns", e))?;
        Dataset::from_columns(names, &columns, labels).map_err(|e| PipelineError::transform("building dataset", e))
    }
}

/// Read a model artifact written by [`ModelTraining::save_model`]
pub fn load_model(path: &Path) -> Result<GbdtClassifier> {
    if !path.exists() {
        return Err(PipelineError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = fs::read(path).map_err(|e| PipelineError::io(format!("reading {}", path.display()), e))?;
    GbdtClassifier::from_bytes(&bytes).map_err(|e| PipelineError::fit(format!("decoding {}", path.display()), e))
}

fn load_numeric(path: &Path) -> Result<NumericTable> {
    if !path.exists() {
        return Err(PipelineError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let table = Table::read_csv(path).map_err(|e| match e {
        TableError::NotFound(path) => PipelineError::NotFound { path },
        TableError::Io { .. } => PipelineError::io(format!("reading {}", path.display()), e),
        other => PipelineError::transform(format!("parsing {}", path.display()), other),
    })?;
    NumericTable::from_table(&table).map_err(|e| PipelineError::transform(format!("parsing {}", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_core::SearchConfig;
    use tempfile::TempDir;

    fn write_processed(path: &Path, rows: std::ops::Range<usize>) {
        let mut body = String::from("lead_time,no_of_special_requests,booking_status\n");
        for i in rows {
            let lead = (i * 37) % 300;
            let requests = i % 4;
            let status = if lead > 150 && requests < 2 { 0 } else { 1 };
            body.push_str(&format!("{},{},{}\n", lead, requests, status));
        }
        fs::write(path, body).unwrap();
    }

    fn setup() -> (TempDir, PathBuf, PathBuf, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let train = tmp.path().join("processed_train.csv");
        let test = tmp.path().join("processed_test.csv");
        write_processed(&train, 0..400);
        write_processed(&test, 400..500);
        let model = tmp.path().join("models").join("gbdt_model.bin");
        (tmp, train, test, model)
    }

    fn config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.model_training.params.n_estimators = 30;
        config.model_training.params.min_child_samples = 5;
        config
    }

    #[test]
    fn test_run_publishes_model_and_metrics() {
        let (_tmp, train, test, model) = setup();
        let report = ModelTraining::new(&train, &test, &model, &config()).run().unwrap();

        assert_eq!(report.train_rows, 400);
        assert_eq!(report.test_rows, 100);
        assert!(report.metrics.accuracy > 0.9);
        assert!(model.exists());

        let json = fs::read_to_string(&report.metrics_path).unwrap();
        let parsed: EvaluationMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.report.support, 100);

        let loaded = load_model(&model).unwrap();
        assert_eq!(loaded.feature_names(), &["lead_time", "no_of_special_requests"]);
        assert_eq!(loaded.n_trees(), 30);
    }

    #[test]
    fn test_search_sets_cv_score() {
        let (_tmp, train, test, model) = setup();
        let mut cfg = config();
        let mut search = SearchConfig {
            n_iter: 2,
            cv_folds: 2,
            ..Default::default()
        };
        search.n_estimators.low = 5;
        search.n_estimators.high = 15;
        cfg.model_training.search = Some(search);

        let report = ModelTraining::new(&train, &test, &model, &cfg).run().unwrap();
        assert!(report.metrics.cv_score.is_some());
        assert!((5..=15).contains(&report.metrics.params.n_estimators));
    }

    #[test]
    fn test_column_mismatch_is_transform_error() {
        let (tmp, train, _test, model) = setup();
        let other = tmp.path().join("other.csv");
        fs::write(&other, "lead_time,booking_status\n1,0\n").unwrap();

        let err = ModelTraining::new(&train, &other, &model, &config()).run().unwrap_err();
        assert_eq!(err.kind(), "transform_failure");
        assert!(!model.exists());
    }

    #[test]
    fn test_invalid_label_leaves_previous_artifact() {
        let (tmp, _train, test, model) = setup();
        fs::create_dir_all(model.parent().unwrap()).unwrap();
        fs::write(&model, b"previous").unwrap();

        let bad_train = tmp.path().join("bad.csv");
        fs::write(&bad_train, "lead_time,no_of_special_requests,booking_status\n1,0,2\n").unwrap();

        let err = ModelTraining::new(&bad_train, &test, &model, &config()).run().unwrap_err();
        assert_eq!(err.kind(), "transform_failure");
        assert_eq!(fs::read(&model).unwrap(), b"previous");
    }

    #[test]
    fn test_failed_search_leaves_previous_artifact() {
        let (tmp, _train, test, model) = setup();
        fs::create_dir_all(model.parent().unwrap()).unwrap();
        fs::write(&model, b"previous").unwrap();
        let metrics = ProjectPaths::metrics_for_model(&model);

        let small_train = tmp.path().join("small.csv");
        write_processed(&small_train, 0..3);
        let mut cfg = config();
        cfg.model_training.search = Some(SearchConfig {
            cv_folds: 5,
            ..Default::default()
        });

        let err = ModelTraining::new(&small_train, &test, &model, &cfg).run().unwrap_err();
        assert_eq!(err.kind(), "fit_failure");
        assert_eq!(fs::read(&model).unwrap(), b"previous");
        assert!(!metrics.exists());
    }

    #[test]
    fn test_load_model_rejects_garbage() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gbdt_model.bin");
        fs::write(&path, [0xffu8; 16]).unwrap();
        assert_eq!(load_model(&path).unwrap_err().kind(), "fit_failure");

        let missing = tmp.path().join("absent.bin");
        assert_eq!(load_model(&missing).unwrap_err().kind(), "not_found");
    }
}
