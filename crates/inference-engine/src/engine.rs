//! Inference Engine Implementation

use crate::InferenceError;
use ndarray::{Array3, Axis};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};
use tract_onnx::prelude::*;

/// Pretrained reconstruction model.
///
/// Given a `(batch, steps, features)` array, returns a reconstruction of the same shape.
pub trait ReconstructionModel {
    fn predict(&self, batch: &Array3<f32>) -> Result<Array3<f32>, InferenceError>;
}

/// Autoencoder exported to ONNX, executed with tract
pub struct OnnxAutoencoder {
    plan: TypedRunnableModel<TypedModel>,
    model_path: String,
}

impl OnnxAutoencoder {
    /// Load and prepare the ONNX model
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(InferenceError::MissingArtifact(path.to_path_buf()));
        }

        info!("Loading autoencoder model from {}", path.display());
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.into_typed())
            .and_then(|model| model.into_decluttered())
            .and_then(|model| model.into_runnable())
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;

        info!("Model loaded successfully");
        Ok(Self {
            plan,
            model_path: path.display().to_string(),
        })
    }

    /// Get model path
    pub fn model_path(&self) -> &str {
        &self.model_path
    }
}

impl ReconstructionModel for OnnxAutoencoder {
    fn predict(&self, batch: &Array3<f32>) -> Result<Array3<f32>, InferenceError> {
        let (windows, steps, features) = batch.dim();
        let data: Vec<f32> = batch.iter().copied().collect();

        let input = Tensor::from_shape(&[windows, steps, features], &data)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;
        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::InferenceFailed("model produced no output".to_string()))?;
        let shape = output.shape().to_vec();
        let values = output
            .as_slice::<f32>()
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?
            .to_vec();

        match shape.as_slice() {
            &[b, s, f] => Array3::from_shape_vec((b, s, f), values)
                .map_err(|e| InferenceError::InferenceFailed(e.to_string())),
            _ => Err(InferenceError::InvalidOutputShape {
                expected: format!("{:?}", [windows, steps, features]),
                actual: format!("{:?}", shape),
            }),
        }
    }
}

/// Computes per-window mean squared reconstruction error
pub struct Scorer<'a> {
    model: &'a dyn ReconstructionModel,
}

impl<'a> Scorer<'a> {
    /// Create a scorer over a loaded model
    pub fn new(model: &'a dyn ReconstructionModel) -> Self {
        Self { model }
    }

    /// Score a normalized `(windows, steps, features)` batch.
    ///
    /// Returns one error per window, in batch order.
    pub fn score(&self, batch: &Array3<f64>) -> Result<Vec<f64>, InferenceError> {
        let start = Instant::now();

        if batch.is_empty() {
            return Err(InferenceError::InferenceFailed("empty batch".to_string()));
        }

        let reconstruction = self.model.predict(&batch.mapv(|v| v as f32))?;
        if reconstruction.dim() != batch.dim() {
            return Err(InferenceError::InvalidOutputShape {
                expected: format!("{:?}", batch.dim()),
                actual: format!("{:?}", reconstruction.dim()),
            });
        }

        let errors: Vec<f64> = batch
            .axis_iter(Axis(0))
            .zip(reconstruction.axis_iter(Axis(0)))
            .map(|(input, output)| {
                let sum: f64 = input
                    .iter()
                    .zip(output.iter())
                    .map(|(x, r)| (x - f64::from(*r)).powi(2))
                    .sum();
                sum / input.len() as f64
            })
            .collect();

        if let Some(window) = errors.iter().position(|e| !e.is_finite()) {
            return Err(InferenceError::InferenceFailed(format!(
                "non-finite reconstruction error for window {}",
                window
            )));
        }

        debug!(
            "Scored {} windows in {}ms",
            errors.len(),
            start.elapsed().as_millis()
        );
        Ok(errors)
    }
}
