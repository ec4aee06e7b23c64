//! Reconstruction Scoring Engine
//!
//! Runs the pretrained autoencoder over window batches, computes per-window
//! reconstruction error, and turns errors into anomaly verdicts.

mod decision;
mod engine;

pub use decision::{DecisionEngine, Threshold, Verdict};
pub use engine::{OnnxAutoencoder, ReconstructionModel, Scorer};

use std::path::PathBuf;
use thiserror::Error;

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid output shape: expected {expected}, got {actual}")]
    InvalidOutputShape { expected: String, actual: String },
    #[error("Artifact not found: {}", .0.display())]
    MissingArtifact(PathBuf),
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
}
