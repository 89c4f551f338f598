//! Evaluation metrics written next to the model

use chrono::{DateTime, Utc};
use gbdt::{ClassificationReport, GbdtParams};
use serde::{Deserialize, Serialize};

/// Test-set scores plus the configuration that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub log_loss: f64,
    /// Full confusion counts
    pub report: ClassificationReport,
    /// Hyperparameters of the evaluated model
    pub params: GbdtParams,
    /// Mean cross-validated score when a search picked the parameters
    pub cv_score: Option<f64>,
    /// Gain importance per feature, highest first
    pub feature_importances: Vec<(String, f64)>,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationMetrics {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
