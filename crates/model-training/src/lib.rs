//! Model Training Stage
//!
//! Fits the gradient-boosted classifier on the processed train partition,
//! scores it on the processed test partition, and publishes the model
//! artifact together with its evaluation metrics.

mod evaluation;
mod params;
mod trainer;

pub use evaluation::EvaluationMetrics;
pub use params::{booster_params, search_space};
pub use trainer::{load_model, FittedModel, ModelTraining, TrainingReport};
