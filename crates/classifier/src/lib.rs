//! Water-Quality Classification Engine
//!
//! Loads a pre-trained classifier once per process and maps 4-element
//! sensor samples to one of six water-quality classes.

mod engine;
mod labels;
mod loader;

pub use engine::{Classifier, Prediction, FEATURE_COUNT};
pub use labels::WaterClass;
pub use loader::{cached_classifier, default_model_path, ModelBackend};

use thiserror::Error;

/// Errors during model loading and inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoad(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Model reports {actual} classes but the label table has {expected}")]
    ClassCountMismatch { expected: usize, actual: usize },
    #[error("Predicted class index {index} outside the {classes}-entry label table")]
    ClassIndexOutOfRange { index: usize, classes: usize },
}
