//! Pipeline Core
//!
//! Shared plumbing for the three pipeline stages: the configuration document,
//! fixed artifact paths, the stage error type, and logging setup.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    DerivedColumn, DerivedKind, FloatRange, IngestionConfig, IntRange, PipelineConfig,
    ProcessingConfig, SearchConfig, SearchScoring, TrainingConfig, TrainingParams,
};
pub use error::{PipelineError, Result};
pub use logging::{init_logging, LoggingError};
pub use paths::{ProjectPaths, ROOT_ENV_VAR};
