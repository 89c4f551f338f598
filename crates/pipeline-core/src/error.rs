//! Stage Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Boxed underlying cause carried by the stage errors
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used by every stage
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors surfaced at a stage boundary
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Required input file is missing
    #[error("Required file not found at: {}", path.display())]
    NotFound { path: PathBuf },

    /// Reading or writing a file failed
    #[error("I/O failure: {context}")]
    Io {
        context: String,
        #[source]
        source: Cause,
    },

    /// Parsing, splitting, or feature transformation failed
    #[error("Transformation failed: {context}")]
    Transform {
        context: String,
        #[source]
        source: Cause,
    },

    /// Model fitting, evaluation, or (de)serialization failed
    #[error("Model fitting failed: {context}")]
    Fit {
        context: String,
        #[source]
        source: Cause,
    },

    /// Configuration document is missing, malformed, or inconsistent
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    /// Wrap an I/O level cause
    pub fn io(context: impl Into<String>, source: impl Into<Cause>) -> Self {
        PipelineError::Io {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Wrap a transformation cause
    pub fn transform(context: impl Into<String>, source: impl Into<Cause>) -> Self {
        PipelineError::Transform {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Wrap a fitting cause
    pub fn fit(context: impl Into<String>, source: impl Into<Cause>) -> Self {
        PipelineError::Fit {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Short tag for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::NotFound { .. } => "not_found",
            PipelineError::Io { .. } => "io_failure",
            PipelineError::Transform { .. } => "transform_failure",
            PipelineError::Fit { .. } => "fit_failure",
            PipelineError::Config(_) => "config",
        }
    }
}
