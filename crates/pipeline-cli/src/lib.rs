//! Pipeline entry points
//!
//! Shared setup for the three stage binaries and one runner per stage. Each
//! runner takes the resolved project layout and configuration so the stages
//! can also be driven in-process.

use anyhow::Context;
use data_ingestion::{DataIngestion, IngestionReport};
use data_preprocessing::{DataProcessor, ProcessingReport};
use model_training::{ModelTraining, TrainingReport};
use pipeline_core::{init_logging, PipelineConfig, ProjectPaths};
use tracing_appender::non_blocking::WorkerGuard;

/// Width of the `=` banner lines
const BANNER_WIDTH: usize = 60;

/// Everything a stage binary needs before it runs
pub struct StageContext {
    pub paths: ProjectPaths,
    pub config: PipelineConfig,
    /// Flushes the log file on drop
    _log_guard: WorkerGuard,
}

impl StageContext {
    /// Resolve the project root, start logging, and load the configuration
    pub fn init() -> anyhow::Result<Self> {
        let paths = ProjectPaths::discover()?;
        let log_guard = init_logging(&paths.logs_dir()).context("initializing logging")?;
        let config = PipelineConfig::load(&paths.config_file())
            .with_context(|| format!("loading {}", paths.config_file().display()))?;
        Ok(Self {
            paths,
            config,
            _log_guard: log_guard,
        })
    }
}

/// Print a banner block: rule, title, rule, labelled lines, rule
pub fn print_banner(title: &str, lines: &[(&str, String)]) {
    let rule = "=".repeat(BANNER_WIDTH);
    println!("{}", rule);
    println!("{}", title);
    println!("{}", rule);
    if !lines.is_empty() {
        for (label, value) in lines {
            println!("{}: {}", label, value);
        }
        println!("{}", rule);
    }
}

pub fn run_ingestion(paths: &ProjectPaths, config: &PipelineConfig) -> anyhow::Result<IngestionReport> {
    let report = DataIngestion::new(config, paths).run()?;
    Ok(report)
}

pub fn run_preprocessing(paths: &ProjectPaths, config: &PipelineConfig) -> anyhow::Result<ProcessingReport> {
    let processor = DataProcessor::new(paths.train_file(), paths.test_file(), paths.processed_dir(), config);
    Ok(processor.process()?)
}

pub fn run_training(paths: &ProjectPaths, config: &PipelineConfig) -> anyhow::Result<TrainingReport> {
    let trainer = ModelTraining::new(
        paths.processed_train_file(),
        paths.processed_test_file(),
        paths.model_output(),
        config,
    );
    Ok(trainer.run()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_core::{DerivedColumn, DerivedKind};
    use std::fs;
    use tabular::Table;
    use tempfile::TempDir;

    const HEADER: &str = "Booking_ID,no_of_adults,no_of_children,no_of_weekend_nights,no_of_week_nights,\
type_of_meal_plan,required_car_parking_space,room_type_reserved,lead_time,arrival_year,arrival_month,\
arrival_date,market_segment_type,repeated_guest,no_of_previous_cancellations,\
no_of_previous_bookings_not_canceled,avg_price_per_room,no_of_special_requests,booking_status";

    fn reservation(i: usize) -> String {
        let lead_time = (i * 53) % 400;
        let requests = i % 4;
        let canceled = lead_time > 180 && requests < 2;
        format!(
            "INN{:05},{},{},{},{},Meal Plan {},{},Room_Type {},{},{},{},{},{},{},{},{},{:.2},{},{}",
            i,
            1 + i % 3,
            i % 2,
            i % 3,
            1 + i % 5,
            1 + i % 3,
            i % 2,
            1 + i % 6,
            lead_time,
            2017 + i % 2,
            1 + i % 12,
            1 + i % 28,
            ["Online", "Offline", "Corporate"][i % 3],
            (i % 10 == 0) as u8,
            (i % 50 == 0) as u8,
            i % 7,
            60.0 + (i % 90) as f64 * 1.5,
            requests,
            if canceled { "Canceled" } else { "Not_Canceled" }
        )
    }

    fn hotel_config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        let processing = &mut config.data_processing;
        processing.categorical_columns = [
            "type_of_meal_plan",
            "required_car_parking_space",
            "room_type_reserved",
            "market_segment_type",
            "repeated_guest",
            "booking_status",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        processing.numerical_columns = [
            "no_of_adults",
            "no_of_children",
            "no_of_weekend_nights",
            "no_of_week_nights",
            "lead_time",
            "arrival_year",
            "arrival_month",
            "arrival_date",
            "no_of_previous_cancellations",
            "no_of_previous_bookings_not_canceled",
            "avg_price_per_room",
            "no_of_special_requests",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        processing.drop_columns = vec!["Booking_ID".into()];
        processing.derived_columns = vec![DerivedColumn {
            name: "total_nights".into(),
            kind: DerivedKind::Sum,
            columns: vec!["no_of_weekend_nights".into(), "no_of_week_nights".into()],
        }];
        processing.selection_estimators = 10;
        config.model_training.params.n_estimators = 40;
        config
    }

    #[test]
    fn test_end_to_end_on_synthetic_reservations() {
        let tmp = TempDir::new().unwrap();
        let paths = ProjectPaths::new(tmp.path().join("project"));
        let source = paths.source_dataset();
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        let mut body = format!("{}\n", HEADER);
        for i in 0..1000 {
            body.push_str(&reservation(i));
            body.push('\n');
        }
        fs::write(&source, body).unwrap();

        let config = hotel_config();

        let ingestion = run_ingestion(&paths, &config).unwrap();
        assert_eq!(ingestion.total_rows, 1000);
        assert_eq!(ingestion.train_rows, 800);
        assert_eq!(ingestion.test_rows, 200);
        assert_eq!(Table::read_csv(&paths.raw_file()).unwrap().n_rows(), 1000);

        let processing = run_preprocessing(&paths, &config).unwrap();
        let train = Table::read_csv(&paths.processed_train_file()).unwrap();
        let test = Table::read_csv(&paths.processed_test_file()).unwrap();
        assert_eq!(train.n_rows(), 800);
        assert_eq!(test.n_rows(), 200);
        assert_eq!(train.headers(), test.headers());
        assert_eq!(train.n_cols(), processing.selected_features.len() + 1);
        assert_eq!(processing.selected_features.len(), 10);

        let training = run_training(&paths, &config).unwrap();
        assert_eq!(training.train_rows, 800);
        assert_eq!(training.test_rows, 200);
        assert!(paths.model_output().exists());
        assert!(paths.metrics_file().exists());
        assert!(training.metrics.accuracy > 0.8);
    }

    #[test]
    fn test_missing_dataset_stops_before_any_output() {
        let tmp = TempDir::new().unwrap();
        let paths = ProjectPaths::new(tmp.path().join("project"));

        let err = run_ingestion(&paths, &hotel_config()).unwrap_err();
        let stage = err.downcast_ref::<pipeline_core::PipelineError>().unwrap();
        assert_eq!(stage.kind(), "not_found");
        assert!(!paths.raw_dir().exists());
    }
}
