//! Threshold Decisions

use crate::InferenceError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Decision boundary on reconstruction error
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Threshold(f64);

/// Persisted threshold: a bare number or `{"threshold": x}`
#[derive(Deserialize)]
#[serde(untagged)]
enum ThresholdArtifact {
    Bare(f64),
    Wrapped { threshold: f64 },
}

impl Threshold {
    /// Create a threshold; must be finite and non-negative
    pub fn new(value: f64) -> Result<Self, InferenceError> {
        if !value.is_finite() || value < 0.0 {
            return Err(InferenceError::InvalidThreshold(format!(
                "{} is not a finite non-negative number",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Load a threshold from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(InferenceError::MissingArtifact(path.to_path_buf()));
        }

        let json = std::fs::read_to_string(path)
            .map_err(|e| InferenceError::InvalidThreshold(format!("{}: {}", path.display(), e)))?;
        let threshold = Self::from_json(&json)?;
        info!("Loaded anomaly threshold {} from {}", threshold.value(), path.display());
        Ok(threshold)
    }

    /// Parse a threshold from JSON
    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        let artifact: ThresholdArtifact = serde_json::from_str(json)
            .map_err(|e| InferenceError::InvalidThreshold(e.to_string()))?;
        match artifact {
            ThresholdArtifact::Bare(value) | ThresholdArtifact::Wrapped { threshold: value } => {
                Self::new(value)
            }
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Anomaly verdict for one window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Mean squared reconstruction error
    pub reconstruction_error: f64,
    /// Whether the error strictly exceeds the threshold
    pub is_anomaly: bool,
}

/// Stateless threshold comparison
#[derive(Debug, Clone, Copy)]
pub struct DecisionEngine {
    threshold: Threshold,
}

impl DecisionEngine {
    /// Create a decision engine for a threshold
    pub fn new(threshold: Threshold) -> Self {
        Self { threshold }
    }

    /// Anomalous iff the error strictly exceeds the threshold
    pub fn is_anomaly(&self, error: f64) -> bool {
        error > self.threshold.value()
    }

    /// Decide every window, preserving order
    pub fn decide(&self, errors: &[f64]) -> Vec<Verdict> {
        let verdicts: Vec<Verdict> = errors
            .iter()
            .map(|&error| Verdict {
                reconstruction_error: error,
                is_anomaly: self.is_anomaly(error),
            })
            .collect();

        debug!(
            "{} of {} windows above threshold {}",
            verdicts.iter().filter(|v| v.is_anomaly).count(),
            verdicts.len(),
            self.threshold.value()
        );
        verdicts
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }
}
