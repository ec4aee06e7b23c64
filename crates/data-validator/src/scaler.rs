//! Pretrained Scaler Artifact

use crate::error::ValidationError;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Fitted feature scaler applied to a `(rows, features)` matrix
pub trait Scaler {
    /// Number of features the scaler was fit on
    fn n_features(&self) -> usize;

    /// Transform every row of the matrix
    fn transform(&self, matrix: Array2<f64>) -> Result<Array2<f64>, ValidationError>;
}

/// Per-feature affine scaler exported from the training environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AffineScaler {
    /// Standardization: `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// Range scaling: `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl AffineScaler {
    /// Load scaler parameters from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ValidationError::MissingArtifact(path.to_path_buf()));
        }

        let json = std::fs::read_to_string(path)?;
        let scaler = Self::from_json(&json)?;
        info!(
            "Loaded {} scaler from {} ({} features)",
            scaler.kind(),
            path.display(),
            scaler.n_features()
        );
        Ok(scaler)
    }

    /// Parse scaler parameters from JSON
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let scaler: Self = serde_json::from_str(json)
            .map_err(|e| ValidationError::InvalidArtifact(e.to_string()))?;
        scaler.check()?;
        Ok(scaler)
    }

    /// Scaler kind name
    pub fn kind(&self) -> &'static str {
        match self {
            AffineScaler::Standard { .. } => "standard",
            AffineScaler::MinMax { .. } => "min_max",
        }
    }

    fn check(&self) -> Result<(), ValidationError> {
        let (offset, scale) = match self {
            AffineScaler::Standard { mean, scale } => (mean, scale),
            AffineScaler::MinMax { min, scale } => (min, scale),
        };

        if offset.is_empty() || offset.len() != scale.len() {
            return Err(ValidationError::InvalidArtifact(format!(
                "parameter lengths differ or are empty: {} vs {}",
                offset.len(),
                scale.len()
            )));
        }
        if offset.iter().chain(scale).any(|v| !v.is_finite()) {
            return Err(ValidationError::InvalidArtifact(
                "non-finite scaler parameter".to_string(),
            ));
        }
        if let AffineScaler::Standard { scale, .. } = self {
            if scale.iter().any(|s| *s == 0.0) {
                return Err(ValidationError::InvalidArtifact(
                    "standard scaler has a zero scale".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Scaler for AffineScaler {
    fn n_features(&self) -> usize {
        match self {
            AffineScaler::Standard { mean, .. } => mean.len(),
            AffineScaler::MinMax { min, .. } => min.len(),
        }
    }

    fn transform(&self, mut matrix: Array2<f64>) -> Result<Array2<f64>, ValidationError> {
        if matrix.ncols() != self.n_features() {
            return Err(ValidationError::Normalization(format!(
                "scaler expects {} features, got {}",
                self.n_features(),
                matrix.ncols()
            )));
        }

        for (j, mut column) in matrix.axis_iter_mut(Axis(1)).enumerate() {
            match self {
                AffineScaler::Standard { mean, scale } => {
                    let (m, s) = (mean[j], scale[j]);
                    column.mapv_inplace(|x| (x - m) / s);
                }
                AffineScaler::MinMax { min, scale } => {
                    let (m, s) = (min[j], scale[j]);
                    column.mapv_inplace(|x| x * s + m);
                }
            }
        }

        Ok(matrix)
    }
}
