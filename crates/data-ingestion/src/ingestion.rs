//! Data Ingestion Stage

use crate::split::train_test_split;
use pipeline_core::{IngestionConfig, PipelineConfig, PipelineError, ProjectPaths, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tabular::{Table, TableError};
use tracing::{error, info};

/// Outcome of a successful ingestion run
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionReport {
    /// Rows in the source dataset
    pub total_rows: usize,
    /// Rows written to the train file
    pub train_rows: usize,
    /// Rows written to the test file
    pub test_rows: usize,
    pub raw_file: PathBuf,
    pub train_file: PathBuf,
    pub test_file: PathBuf,
}

/// Copies the source dataset and writes the train/test partitions
pub struct DataIngestion {
    /// Split ratios and seed
    config: IngestionConfig,
    /// External CSV to ingest
    source_path: PathBuf,
    /// Directory receiving raw, train, and test files
    raw_dir: PathBuf,
    raw_file: PathBuf,
    train_file: PathBuf,
    test_file: PathBuf,
}

impl DataIngestion {
    /// Create the stage from the configuration document and project layout
    pub fn new(config: &PipelineConfig, paths: &ProjectPaths) -> Self {
        let ingestion = Self {
            config: config.data_ingestion.clone(),
            source_path: paths.source_dataset(),
            raw_dir: paths.raw_dir(),
            raw_file: paths.raw_file(),
            train_file: paths.train_file(),
            test_file: paths.test_file(),
        };

        info!("Data Ingestion initialized");
        info!("Local dataset path: {}", ingestion.source_path.display());
        info!("Output directory: {}", ingestion.raw_dir.display());
        info!(
            "Train/Test split ratio: {}/{}",
            ingestion.config.train_ratio, ingestion.config.test_ratio
        );
        ingestion
    }

    /// Use a different source CSV than the fixed project location
    pub fn with_source_path(mut self, source_path: impl Into<PathBuf>) -> Self {
        self.source_path = source_path.into();
        self
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Load the source dataset and save an unmodified copy as raw.csv
    pub fn load_local_dataset(&self) -> Result<Table> {
        self.try_load().map_err(|e| {
            error!("Error while loading local dataset: {}", e);
            e
        })
    }

    fn try_load(&self) -> Result<Table> {
        info!("Loading dataset from: {}", self.source_path.display());

        if !self.source_path.exists() {
            return Err(PipelineError::NotFound {
                path: self.source_path.clone(),
            });
        }

        let data = Table::read_csv(&self.source_path).map_err(|e| read_error(&self.source_path, e))?;
        info!("Dataset loaded successfully with shape: ({}, {})", data.n_rows(), data.n_cols());

        self.ensure_raw_dir()?;
        data.write_csv(&self.raw_file)
            .map_err(|e| PipelineError::io(format!("writing {}", self.raw_file.display()), e))?;
        info!("Raw data saved to: {}", self.raw_file.display());

        Ok(data)
    }

    /// Split rows into train and test files; returns (train_rows, test_rows)
    pub fn split_data(&self, data: &Table) -> Result<(usize, usize)> {
        self.try_split(data).map_err(|e| {
            error!("Error while splitting data: {}", e);
            e
        })
    }

    fn try_split(&self, data: &Table) -> Result<(usize, usize)> {
        info!("Starting data splitting process");
        info!("Total records: {}", data.n_rows());

        let (train, test) = train_test_split(
            data,
            self.config.train_ratio,
            self.config.test_ratio,
            self.config.random_seed,
        )?;

        self.ensure_raw_dir()?;
        train
            .write_csv(&self.train_file)
            .map_err(|e| PipelineError::io(format!("writing {}", self.train_file.display()), e))?;
        info!("Train data saved to: {}", self.train_file.display());
        info!(
            "Train records: {} ({}%)",
            train.n_rows(),
            self.config.train_ratio * 100.0
        );

        test.write_csv(&self.test_file)
            .map_err(|e| PipelineError::io(format!("writing {}", self.test_file.display()), e))?;
        info!("Test data saved to: {}", self.test_file.display());
        info!("Test records: {} ({}%)", test.n_rows(), self.config.test_ratio * 100.0);

        info!("Data splitting completed successfully");
        Ok((train.n_rows(), test.n_rows()))
    }

    /// Load, copy, and split
    pub fn run(&self) -> Result<IngestionReport> {
        let banner = "=".repeat(60);
        info!("{}", banner);
        info!("Starting Data Ingestion Process");
        info!("{}", banner);

        let data = self.load_local_dataset()?;
        let (train_rows, test_rows) = self.split_data(&data)?;

        info!("{}", banner);
        info!("Data Ingestion Completed Successfully!");
        info!("{}", banner);
        info!("Files created:");
        info!("  1. Raw data: {}", self.raw_file.display());
        info!("  2. Train data: {}", self.train_file.display());
        info!("  3. Test data: {}", self.test_file.display());
        info!("{}", banner);

        Ok(IngestionReport {
            total_rows: data.n_rows(),
            train_rows,
            test_rows,
            raw_file: self.raw_file.clone(),
            train_file: self.train_file.clone(),
            test_file: self.test_file.clone(),
        })
    }

    fn ensure_raw_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.raw_dir)
            .map_err(|e| PipelineError::io(format!("creating {}", self.raw_dir.display()), e))
    }
}

fn read_error(path: &Path, err: TableError) -> PipelineError {
    match err {
        TableError::NotFound(path) => PipelineError::NotFound { path },
        TableError::Io { .. } => PipelineError::io(format!("reading {}", path.display()), err),
        other => PipelineError::transform(format!("parsing {}", path.display()), other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Project root at `<tmp>/project`, dataset at the fixed sibling location
    fn layout(rows: usize) -> (TempDir, ProjectPaths) {
        let tmp = TempDir::new().unwrap();
        let paths = ProjectPaths::new(tmp.path().join("project"));
        let source = paths.source_dataset();
        fs::create_dir_all(source.parent().unwrap()).unwrap();

        let mut body = String::from("Booking_ID,lead_time,booking_status\n");
        for i in 0..rows {
            let status = if i % 3 == 0 { "Canceled" } else { "Not_Canceled" };
            body.push_str(&format!("INN{:05},{},{}\n", i, i % 200, status));
        }
        fs::write(&source, body).unwrap();
        (tmp, paths)
    }

    #[test]
    fn test_run_writes_all_three_files() {
        let (_tmp, paths) = layout(100);
        let ingestion = DataIngestion::new(&PipelineConfig::default(), &paths);

        let report = ingestion.run().unwrap();
        assert_eq!(report.total_rows, 100);
        assert_eq!(report.train_rows, 80);
        assert_eq!(report.test_rows, 20);

        assert_eq!(Table::read_csv(&paths.raw_file()).unwrap().n_rows(), 100);
        assert_eq!(Table::read_csv(&paths.train_file()).unwrap().n_rows(), 80);
        assert_eq!(Table::read_csv(&paths.test_file()).unwrap().n_rows(), 20);
    }

    #[test]
    fn test_raw_copy_matches_loaded_table() {
        let (_tmp, paths) = layout(37);
        let ingestion = DataIngestion::new(&PipelineConfig::default(), &paths);

        let data = ingestion.load_local_dataset().unwrap();
        assert_eq!(Table::read_csv(&paths.raw_file()).unwrap(), data);
        assert_eq!(
            fs::read(&paths.raw_file()).unwrap(),
            fs::read(&paths.source_dataset()).unwrap()
        );
    }

    #[test]
    fn test_missing_dataset_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let paths = ProjectPaths::new(tmp.path().join("project"));
        let ingestion = DataIngestion::new(&PipelineConfig::default(), &paths);

        let err = ingestion.run().unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));
        assert!(!paths.raw_dir().exists());
        assert!(!paths.raw_file().exists());
        assert!(!paths.train_file().exists());
    }

    #[test]
    fn test_repeated_runs_identical() {
        let (_tmp, paths) = layout(64);
        let ingestion = DataIngestion::new(&PipelineConfig::default(), &paths);

        ingestion.run().unwrap();
        let first = fs::read(&paths.train_file()).unwrap();
        ingestion.run().unwrap();
        assert_eq!(fs::read(&paths.train_file()).unwrap(), first);
    }

    #[test]
    fn test_ragged_source_is_transform_failure() {
        let (_tmp, paths) = layout(0);
        fs::write(paths.source_dataset(), "a,b\n1,2\n3\n").unwrap();
        let ingestion = DataIngestion::new(&PipelineConfig::default(), &paths);

        let err = ingestion.load_local_dataset().unwrap_err();
        assert_eq!(err.kind(), "transform_failure");
        assert!(!paths.raw_file().exists());
    }

    #[test]
    fn test_custom_source_path() {
        let (tmp, paths) = layout(10);
        let other = tmp.path().join("other.csv");
        fs::copy(paths.source_dataset(), &other).unwrap();

        let ingestion =
            DataIngestion::new(&PipelineConfig::default(), &paths).with_source_path(&other);
        assert_eq!(ingestion.source_path(), other.as_path());
        assert_eq!(ingestion.load_local_dataset().unwrap().n_rows(), 10);
    }
}
