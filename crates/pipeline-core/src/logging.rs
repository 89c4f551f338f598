//! Logging setup
//!
//! Installs a global tracing subscriber writing to stdout and to a per-day
//! file `logs/log_YYYY-MM-DD.log`. The returned guard flushes the file writer
//! when dropped, so binaries keep it alive until the stage finishes.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Errors while installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Log directory could not be created
    #[error("Failed to prepare log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A global subscriber is already installed
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Initialize tracing to stdout and the daily log file
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard, LoggingError> {
    fs::create_dir_all(log_dir).map_err(|source| LoggingError::CreateDir {
        path: log_dir.to_path_buf(),
        source,
    })?;

    let file_name = log_file_name(chrono::Local::now().date_naive());
    let file_appender = rolling::never(log_dir, &file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true).with_writer(std::io::stdout);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer);

    let subscriber = Registry::default()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!("Logging initialized; log file at {}", log_dir.join(&file_name).display());
    Ok(guard)
}

fn log_file_name(date: chrono::NaiveDate) -> String {
    format!("log_{}.log", date.format("%Y-%m-%d"))
}
