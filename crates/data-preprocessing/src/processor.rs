//! Data Processor

use crate::derived::compute_derived;
use crate::encoder::LabelEncoder;
use crate::selection::FeatureSelector;
use crate::skew::SkewCorrector;
use crate::FeatureError;
use pipeline_core::{PipelineConfig, PipelineError, ProcessingConfig, ProjectPaths, Result};
use std::path::{Path, PathBuf};
use tabular::{AtomicWriter, NumericTable, Table, TableError};
use tracing::{error, info, warn};

/// Outcome of a successful preprocessing run
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingReport {
    pub train_rows: usize,
    pub test_rows: usize,
    /// Kept features in rank order; the label follows them in the files
    pub selected_features: Vec<String>,
    /// Columns that received `ln(1 + x)`
    pub skewed_columns: Vec<String>,
    pub processed_train: PathBuf,
    pub processed_test: PathBuf,
}

/// Fits the feature pipeline on train and applies it to both partitions
pub struct DataProcessor {
    train_path: PathBuf,
    test_path: PathBuf,
    processed_dir: PathBuf,
    config: ProcessingConfig,
    /// Seed for the ranking model
    seed: u64,
}

impl DataProcessor {
    pub fn new(
        train_path: impl Into<PathBuf>,
        test_path: impl Into<PathBuf>,
        processed_dir: impl Into<PathBuf>,
        config: &PipelineConfig,
    ) -> Self {
        let processor = Self {
            train_path: train_path.into(),
            test_path: test_path.into(),
            processed_dir: processed_dir.into(),
            config: config.data_processing.clone(),
            seed: config.model_training.params.random_seed,
        };
        info!("Data Processor initialized");
        info!("Processed output directory: {}", processor.processed_dir.display());
        processor
    }

    /// Run every step and publish both processed files
    pub fn process(&self) -> Result<ProcessingReport> {
        self.try_process().map_err(|e| {
            error!("Error during preprocessing ({}): {}", e.kind(), e);
            e
        })
    }

    fn try_process(&self) -> Result<ProcessingReport> {
        info!("Starting data processing");

        let mut train = load(&self.train_path)?;
        let mut test = load(&self.test_path)?;
        info!("Loaded train {:?} and test {:?}", (train.n_rows(), train.n_cols()), (test.n_rows(), test.n_cols()));

        self.drop_columns(&mut train, &mut test);

        let (mut train_num, mut test_num) = self.encode(&train, &test).map_err(transform)?;
        self.add_derived(&mut train_num, &mut test_num).map_err(transform)?;

        let mut corrector = SkewCorrector::new(self.config.skewness_threshold);
        let candidates = self.skew_candidates();
        corrector.fit(&train_num, &candidates).map_err(transform)?;
        corrector.apply(&mut train_num).map_err(transform)?;
        corrector.apply(&mut test_num).map_err(transform)?;

        let label = self.config.label_column.as_str();
        let features: Vec<&str> = train_num
            .names()
            .iter()
            .map(String::as_str)
            .filter(|&n| n != label)
            .collect();
        let labels = train_num.column(label).map_err(table_transform)?.to_vec();
        let selector =
            FeatureSelector::new(self.config.no_of_features, self.config.selection_estimators, self.seed);
        let selected = selector
            .select(&train_num, &features, &labels)
            .map_err(|e| PipelineError::fit("ranking features", e))?;

        let mut output_columns = selected.clone();
        output_columns.push(self.config.label_column.clone());
        let train_out = train_num.select(&output_columns).map_err(table_transform)?.to_table();
        let test_out = test_num.select(&output_columns).map_err(table_transform)?.to_table();

        let (train_name, test_name) = ProjectPaths::processed_file_names();
        let processed_train = self.processed_dir.join(train_name);
        let processed_test = self.processed_dir.join(test_name);

        let mut writer = AtomicWriter::new();
        writer.stage_table(&train_out, &processed_train).map_err(write_error)?;
        writer.stage_table(&test_out, &processed_test).map_err(write_error)?;
        writer.commit().map_err(write_error)?;

        info!("Processed train saved to: {}", processed_train.display());
        info!("Processed test saved to: {}", processed_test.display());
        info!("Data processing completed successfully");

        Ok(ProcessingReport {
            train_rows: train_out.n_rows(),
            test_rows: test_out.n_rows(),
            selected_features: selected,
            skewed_columns: corrector.columns().to_vec(),
            processed_train,
            processed_test,
        })
    }

    fn drop_columns(&self, train: &mut Table, test: &mut Table) {
        let removed = train.drop_columns(&self.config.drop_columns);
        test.drop_columns(&self.config.drop_columns);
        for name in &self.config.drop_columns {
            if !removed.contains(name) {
                warn!("Drop column {} not present in train data", name);
            }
        }
        if !removed.is_empty() {
            info!("Dropped columns: {:?}", removed);
        }
    }

    /// Numeric tables holding numerical columns, encoded categoricals, and the label
    fn encode(&self, train: &Table, test: &Table) -> std::result::Result<(NumericTable, NumericTable), FeatureError> {
        let label = &self.config.label_column;
        let mut train_num = NumericTable::with_rows(train.n_rows());
        let mut test_num = NumericTable::with_rows(test.n_rows());

        for name in self.numerical_columns() {
            train_num.push_column(name, parse(train, name)?).map_err(table_feature)?;
            test_num.push_column(name, parse(test, name)?).map_err(table_feature)?;
        }

        for name in self.config.categorical_columns.iter().filter(|c| *c != label) {
            let train_values = cells(train, name)?;
            let test_values = cells(test, name)?;
            let encoder = LabelEncoder::fit(name, &train_values);
            info!("Encoded {}: {} classes", name, encoder.n_classes());

            let (train_codes, _) = encoder.transform(&train_values);
            let (test_codes, unseen) = encoder.transform(&test_values);
            if unseen > 0 {
                warn!(
                    "Column {}: {} test value(s) not seen in train, coded as {}",
                    name,
                    unseen,
                    encoder.n_classes()
                );
            }
            train_num.push_column(name, train_codes).map_err(table_feature)?;
            test_num.push_column(name, test_codes).map_err(table_feature)?;
        }

        let train_labels = cells(train, label)?;
        let encoder = LabelEncoder::fit(label, &train_labels);
        if encoder.n_classes() > 2 {
            return Err(FeatureError::NotBinary {
                column: label.clone(),
                classes: encoder.n_classes(),
            });
        }
        info!("Label mapping for {}: {:?}", label, encoder.classes());
        let train_codes = encoder.transform_strict(&train_labels)?;
        let test_codes = encoder.transform_strict(&cells(test, label)?)?;
        train_num.push_column(label, train_codes).map_err(table_feature)?;
        test_num.push_column(label, test_codes).map_err(table_feature)?;

        Ok((train_num, test_num))
    }

    fn add_derived(&self, train: &mut NumericTable, test: &mut NumericTable) -> std::result::Result<(), FeatureError> {
        for derived in &self.config.derived_columns {
            let train_values = compute_derived(derived, train)?;
            let test_values = compute_derived(derived, test)?;
            train.push_column(&derived.name, train_values).map_err(table_feature)?;
            test.push_column(&derived.name, test_values).map_err(table_feature)?;
            info!("Derived column {} ({:?} of {:?})", derived.name, derived.kind, derived.columns);
        }
        Ok(())
    }

    /// Numerical columns that are neither categorical nor the label
    fn numerical_columns(&self) -> impl Iterator<Item = &String> {
        self.config.numerical_columns.iter().filter(move |c| {
            **c != self.config.label_column && !self.config.categorical_columns.contains(*c)
        })
    }

    fn skew_candidates(&self) -> Vec<String> {
        self.numerical_columns()
            .cloned()
            .chain(self.config.derived_columns.iter().map(|d| d.name.clone()))
            .collect()
    }
}

fn load(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(PipelineError::NotFound {
            path: path.to_path_buf(),
        });
    }
    Table::read_csv(path).map_err(|e| match e {
        TableError::NotFound(path) => PipelineError::NotFound { path },
        TableError::Io { .. } => PipelineError::io(format!("reading {}", path.display()), e),
        other => PipelineError::transform(format!("parsing {}", path.display()), other),
    })
}

fn cells<'t>(table: &'t Table, name: &str) -> std::result::Result<Vec<&'t str>, FeatureError> {
    table
        .column(name)
        .map_err(|_| FeatureError::MissingColumn(name.to_string()))
}

fn parse(table: &Table, name: &str) -> std::result::Result<Vec<f64>, FeatureError> {
    table.numeric_column(name).map_err(table_feature)
}

fn table_feature(err: TableError) -> FeatureError {
    match err {
        TableError::MissingColumn(name) => FeatureError::MissingColumn(name),
        other => FeatureError::Table(other),
    }
}

fn transform(err: FeatureError) -> PipelineError {
    PipelineError::transform("preprocessing features", err)
}

fn table_transform(err: TableError) -> PipelineError {
    PipelineError::transform("selecting processed columns", err)
}

fn write_error(err: TableError) -> PipelineError {
    PipelineError::io("writing processed data", err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_core::{DerivedColumn, DerivedKind};
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "Booking_ID,no_of_adults,lead_time,avg_price_per_room,room_type_reserved,booking_status";

    fn row(i: usize) -> String {
        let canceled = i % 4 == 0 || (i % 7 == 0 && i % 2 == 1);
        format!(
            "INN{:05},{},{},{}.5,Room_Type {},{}",
            i,
            1 + i % 3,
            if canceled { 200 + i % 50 } else { i % 30 },
            80 + i % 40,
            1 + i % 4,
            if canceled { "Canceled" } else { "Not_Canceled" }
        )
    }

    fn write_csv(path: &Path, rows: impl Iterator<Item = String>) {
        let mut body = format!("{}\n", HEADER);
        for r in rows {
            body.push_str(&r);
            body.push('\n');
        }
        fs::write(path, body).unwrap();
    }

    fn config(no_of_features: usize) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.data_processing = ProcessingConfig {
            categorical_columns: vec!["room_type_reserved".into(), "booking_status".into()],
            numerical_columns: vec!["no_of_adults".into(), "lead_time".into(), "avg_price_per_room".into()],
            drop_columns: vec!["Booking_ID".into(), "Unnamed: 0".into()],
            derived_columns: vec![DerivedColumn {
                name: "price_per_adult".into(),
                kind: DerivedKind::Ratio,
                columns: vec!["avg_price_per_room".into(), "no_of_adults".into()],
            }],
            no_of_features,
            selection_estimators: 10,
            ..Default::default()
        };
        config
    }

    fn setup(train_rows: usize, test_rows: usize) -> (TempDir, PathBuf, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let train = tmp.path().join("train.csv");
        let test = tmp.path().join("test.csv");
        write_csv(&train, (0..train_rows).map(row));
        write_csv(&test, (train_rows..train_rows + test_rows).map(row));
        (tmp, train, test)
    }

    #[test]
    fn test_process_writes_matching_schemas() {
        let (tmp, train, test) = setup(160, 40);
        let out = tmp.path().join("processed");
        let processor = DataProcessor::new(&train, &test, &out, &config(3));

        let report = processor.process().unwrap();
        assert_eq!(report.train_rows, 160);
        assert_eq!(report.test_rows, 40);
        assert_eq!(report.selected_features.len(), 3);

        let train_out = Table::read_csv(&report.processed_train).unwrap();
        let test_out = Table::read_csv(&report.processed_test).unwrap();
        assert_eq!(train_out.headers(), test_out.headers());
        assert_eq!(train_out.n_rows(), 160);
        assert_eq!(test_out.n_rows(), 40);
        assert_eq!(train_out.headers().last().unwrap(), "booking_status");
        assert!(!train_out.has_column("Booking_ID"));

        let allowed = [
            "no_of_adults",
            "lead_time",
            "avg_price_per_room",
            "room_type_reserved",
            "price_per_adult",
            "booking_status",
        ];
        assert!(train_out.headers().iter().all(|h| allowed.contains(&h.as_str())));

        let labels = train_out.numeric_column("booking_status").unwrap();
        assert!(labels.iter().all(|&l| l == 0.0 || l == 1.0));
    }

    #[test]
    fn test_unseen_test_category_is_coded_not_rejected() {
        let (tmp, train, test) = setup(120, 0);
        write_csv(
            &test,
            ["INN99999,2,10,90.5,Room_Type 7,Not_Canceled".to_string()].into_iter(),
        );
        let out = tmp.path().join("processed");
        let mut cfg = config(10);
        cfg.data_processing.skewness_threshold = 100.0;

        let report = DataProcessor::new(&train, &test, &out, &cfg).process().unwrap();
        let test_out = Table::read_csv(&report.processed_test).unwrap();
        assert_eq!(test_out.column("room_type_reserved").unwrap(), vec!["4"]);
    }

    #[test]
    fn test_unseen_label_fails_without_output() {
        let (tmp, train, test) = setup(120, 0);
        write_csv(&test, ["INN99999,2,10,90.5,Room_Type 1,Pending".to_string()].into_iter());
        let out = tmp.path().join("processed");

        let err = DataProcessor::new(&train, &test, &out, &config(3)).process().unwrap_err();
        assert_eq!(err.kind(), "transform_failure");
        assert!(!out.join("processed_train.csv").exists());
        assert!(!out.join("processed_test.csv").exists());
    }

    #[test]
    fn test_non_numeric_cell_is_transform_error() {
        let (tmp, train, test) = setup(50, 10);
        let mut body = fs::read_to_string(&train).unwrap();
        body.push_str("INN77777,two,10,90.5,Room_Type 1,Canceled\n");
        fs::write(&train, body).unwrap();

        let err = DataProcessor::new(&train, &test, tmp.path().join("p"), &config(3))
            .process()
            .unwrap_err();
        assert_eq!(err.kind(), "transform_failure");
    }

    #[test]
    fn test_missing_input_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = DataProcessor::new(
            tmp.path().join("nope.csv"),
            tmp.path().join("nope2.csv"),
            tmp.path().join("p"),
            &config(3),
        )
        .process()
        .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }
}
