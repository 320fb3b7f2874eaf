//! Classification Engine Implementation

use std::cmp::Ordering;
use std::path::Path;

use serde::Serialize;
use tract_onnx::prelude::*;
use tracing::{debug, info, warn};

use crate::labels::WaterClass;
use crate::InferenceError;

/// Number of sensor readings per sample:
/// dissolved oxygen, pH, salinity, temperature (fixed order).
pub const FEATURE_COUNT: usize = 4;

type OnnxPlan = TypedRunnableModel<TypedModel>;

/// Result of classifying one sensor sample
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// Class index reported by the model
    pub class_index: usize,
    /// Label looked up from the class table
    pub class: WaterClass,
    /// Probability of the predicted class as a percentage, rounded
    /// to two decimal places
    pub confidence: f64,
}

enum Backend {
    Onnx(OnnxPlan),
    Heuristic,
}

/// Water-quality classifier over a fixed 4-feature sample.
///
/// Inference is a pure function of the loaded model and the sample;
/// the engine holds no mutable state.
pub struct Classifier {
    backend: Backend,
}

impl Classifier {
    /// Load an ONNX model from disk.
    ///
    /// The artifact must take a `[1, 4]` f32 input and expose the
    /// per-class probability vector as its last output (exported with
    /// plain tensor outputs, no ZipMap).
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        info!("Loading classifier model from {}", path.display());

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| InferenceError::ModelLoad(e.to_string()))?
            .with_input_fact(0, f32::fact([1, FEATURE_COUNT]).into())
            .map_err(|e| InferenceError::ModelLoad(e.to_string()))?
            .into_optimized()
            .map_err(|e| InferenceError::ModelLoad(e.to_string()))?
            .into_runnable()
            .map_err(|e| InferenceError::ModelLoad(e.to_string()))?;

        Self::check_class_count(&plan)?;
        info!("Model loaded successfully");

        Ok(Self {
            backend: Backend::Onnx(plan),
        })
    }

    /// Create a rule-based classifier requiring no model artifact.
    ///
    /// Used in development and tests; production deployments load the
    /// trained ONNX model instead.
    pub fn heuristic() -> Self {
        info!("Creating heuristic classifier");
        Self {
            backend: Backend::Heuristic,
        }
    }

    /// Verify the model's output width against the label table.
    ///
    /// The class-index-to-label mapping is a contract with the trained
    /// artifact; a width mismatch means the wrong model is on disk.
    fn check_class_count(plan: &OnnxPlan) -> Result<(), InferenceError> {
        let model = plan.model();
        let last_output = model.outputs.len().saturating_sub(1);
        let fact = model
            .output_fact(last_output)
            .map_err(|e| InferenceError::ModelLoad(e.to_string()))?;

        match fact.shape.as_concrete() {
            Some(dims) => {
                let width = dims.last().copied().unwrap_or(0);
                if width != WaterClass::COUNT {
                    return Err(InferenceError::ClassCountMismatch {
                        expected: WaterClass::COUNT,
                        actual: width,
                    });
                }
                debug!("Model output width {} matches label table", width);
            }
            None => {
                warn!("Model output width is symbolic; class count not verified");
            }
        }

        Ok(())
    }

    /// Classify one sensor sample.
    ///
    /// No physical range validation is performed here; out-of-range
    /// values pass through to the model unchecked.
    pub fn predict(&self, sample: &[f64; FEATURE_COUNT]) -> Result<Prediction, InferenceError> {
        debug!("Raw sample: {:?}", sample);

        let probabilities = match &self.backend {
            Backend::Onnx(plan) => Self::onnx_probabilities(plan, sample)?,
            Backend::Heuristic => Self::heuristic_probabilities(sample),
        };

        let (class_index, &top) = probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(Ordering::Equal))
            .ok_or_else(|| {
                InferenceError::InferenceFailed("empty probability vector".to_string())
            })?;

        let class = WaterClass::from_index(class_index).ok_or(
            InferenceError::ClassIndexOutOfRange {
                index: class_index,
                classes: WaterClass::COUNT,
            },
        )?;

        let confidence = round_two_places(top * 100.0);
        info!(
            class = class.as_str(),
            confidence, "Classification complete"
        );

        Ok(Prediction {
            class_index,
            class,
            confidence,
        })
    }

    fn onnx_probabilities(
        plan: &OnnxPlan,
        sample: &[f64; FEATURE_COUNT],
    ) -> Result<Vec<f64>, InferenceError> {
        let values: Vec<f32> = sample.iter().map(|v| *v as f32).collect();
        let input = tract_ndarray::Array2::from_shape_vec((1, FEATURE_COUNT), values)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let outputs = plan
            .run(tvec!(Tensor::from(input).into()))
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        // sklearn-style exports emit (label, probabilities); the
        // probability vector is always the last output.
        let probabilities = outputs.last().ok_or_else(|| {
            InferenceError::InferenceFailed("model produced no outputs".to_string())
        })?;

        let view = probabilities
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        Ok(view.iter().map(|p| *p as f64).collect())
    }

    /// Threshold-based probabilities for the heuristic backend
    fn heuristic_probabilities(sample: &[f64; FEATURE_COUNT]) -> Vec<f64> {
        let [dissolved_oxygen, ph, salinity, temperature] = *sample;

        let (class, confidence) = if ph < 6.5 {
            let conf = (0.5 + (6.5 - ph) / 6.5).clamp(0.5, 0.99);
            (WaterClass::LowPh, conf)
        } else if ph > 8.5 {
            let conf = (0.5 + (ph - 8.5) / 5.5).clamp(0.5, 0.99);
            (WaterClass::HighPh, conf)
        } else if salinity > 35.0 {
            let conf = (salinity / 70.0).clamp(0.5, 0.95);
            (WaterClass::Salt, conf)
        } else if dissolved_oxygen < 4.0 {
            // Oxygen depletion is the usual signature of organic load
            let conf = (1.0 - dissolved_oxygen / 8.0).clamp(0.5, 0.95);
            (WaterClass::Organic, conf)
        } else if temperature > 40.0 {
            (WaterClass::Chemical, 0.6)
        } else {
            (WaterClass::Clean, 0.95)
        };

        let remainder = (1.0 - confidence) / (WaterClass::COUNT - 1) as f64;
        let mut probabilities = vec![remainder; WaterClass::COUNT];
        probabilities[class.index()] = confidence;
        probabilities
    }
}

fn round_two_places(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
